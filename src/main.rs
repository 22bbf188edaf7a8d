fn main() {
    if let Err(e) = cardapio_lib::run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
