mod cmd;

use crate::cmd::Cmd;

use clap::Parser as _;

fn main() -> anyhow::Result<()> {
    human_panic::setup_panic!();
    let cmd = Cmd::parse();
    cmd.run()
}
