fn main() {
    if let Err(err) = shapecloud::cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
