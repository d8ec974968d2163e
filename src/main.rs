fn main() {
    if let Err(err) = ollama_chat::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
