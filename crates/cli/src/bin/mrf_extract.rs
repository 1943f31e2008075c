use anyhow::Result;

fn main() -> Result<()> {
    mrf_cli::main_entry()
}
