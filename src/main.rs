fn main() {
    if let Err(e) = specimen_autofill_lib::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
