fn main() {
    if let Err(error) = dataset_insights::run() {
        eprintln!("Error: {error:?}");
        std::process::exit(1);
    }
}
