use pledgewell_server::Error;

fn main() -> Result<(), Error> {
    let seed_demo_data = std::env::var_os("SEED_DEMO_DATA").is_some();

    pledgewell_server::run(seed_demo_data)
}
