fn main() {
    if let Err(e) = annocompare::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
