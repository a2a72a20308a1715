fn main() {
    if let Err(err) = kernel::cli::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
