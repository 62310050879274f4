use collect::Console;
use data::Config;
use log::info;
use menu::Menu;
use store::CsvStore;

mod collect;
mod compute;
mod data;
mod menu;
mod report;
mod store;

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let config = Config::default();
    let store = CsvStore::new(&config);
    info!("keeping expenses in {}", store.path().display());
    let stdin = std::io::stdin();
    let console = Console::new(stdin.lock(), std::io::stdout());
    Menu::new(&config, store, console).run()?;
    Ok(())
}
