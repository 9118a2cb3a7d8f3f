use datathread::ui::output;

fn main() {
    if let Err(err) = datathread::cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
