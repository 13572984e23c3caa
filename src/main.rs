use plexus::Config;

fn main() {
    env_logger::init();

    if let Err(e) = plexus::run(Config::default()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
