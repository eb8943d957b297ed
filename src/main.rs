use std::env;
use std::fs;
use std::process;

use svmc::compile;

fn main() {
  let args: Vec<String> = env::args().collect();
  if args.len() != 2 {
    let program = args.first().map(String::as_str).unwrap_or("svmc");
    eprintln!("usage: {program} <source-file>");
    process::exit(1);
  }

  let source = match fs::read_to_string(&args[1]) {
    Ok(source) => source,
    Err(err) => {
      eprintln!("cannot read {}: {err}", args[1]);
      process::exit(1);
    }
  };

  match compile(&source) {
    Ok(instructions) => print!("{instructions}"),
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  }
}
