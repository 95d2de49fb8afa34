fn main() {
    if let Err(err) = timeoff_crawler::run() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}
