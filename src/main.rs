use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    dutycheck::cli::run(std::env::args().skip(1))
}
