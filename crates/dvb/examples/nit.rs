use std::io::Write;

use dvb::observe::LogObserver;
use dvb::psi::table::{NitSegment, NitSegmentSet};
use dvb::psi::{DecodeError, PsiSection};

const HELP: &str = "\
NITから選局パラメータを取り出すコマンド

USAGE:
  nit [OPTIONS] [PATH]

FLAGS:
  -h, --help   このヘルプを表示する
  -u, --unique 分配システムと周波数が同じものを除く
  -t, --trace  記述子を読むたびにログを出力する

ARGS:
  <PATH>       PSIセクションを連続して格納したファイルのパス
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{}", HELP);
        std::process::exit(0);
    }

    let unique = args.contains(["-u", "--unique"]);
    let trace = args.contains(["-t", "--trace"]);
    let path: std::path::PathBuf = args.free_from_str()?;

    env_logger::init();

    let data = std::fs::read(path)?;

    let mut set = NitSegmentSet::new();
    for psi in PsiSection::iter(&data) {
        let psi = psi?;
        let segment = if trace {
            NitSegment::from_section_with(&psi, &mut LogObserver)
        } else {
            NitSegment::from_section(&psi)
        };

        match segment {
            Ok(segment) => set.push(segment),
            Err(DecodeError::UnexpectedTable(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    for segment in &set {
        if let Some(header) = &segment.header {
            log::info!(
                "network 0x{:04X} version {} section {}/{}",
                header.network_id,
                header.version_number,
                header.section_number,
                header.last_section_number,
            );
        }
    }

    let transponders = if unique {
        set.unique_transponders()
    } else {
        set.merge()
    };

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    for transponder in &transponders {
        writeln!(stdout, "{}", transponder)?;
    }

    Ok(())
}
