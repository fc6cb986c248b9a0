fn main() {
    if let Err(err) = csv_remap::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
