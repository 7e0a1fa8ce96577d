use jvm_frames::jvm::class_graph::{ClassGraph, ClassGraphArenas};
use jvm_frames::jvm::{Compute, Error, Settings};
use jvm_frames::listing;

use clap::{value_parser, Arg, ArgAction, Command};
use std::fs;
use std::io::{self, Read, Write};

fn main() -> Result<(), Error> {
    env_logger::init();

    let matches = Command::new("JVM frame calculator")
        .version("0.1.0")
        .author("Alec Theriault <alec.theriault@gmail.com>")
        .about("Recompute max stack, max locals, and stack map frames of JVM assembly listings")
        .arg(
            Arg::new("maxes-only")
                .long("maxes-only")
                .action(ArgAction::SetTrue)
                .help("Only recompute max stack and max locals"),
        )
        .arg(
            Arg::new("no-runtime-classes")
                .long("no-runtime-classes")
                .action(ArgAction::SetTrue)
                .help("Don't preload standard library classes into the class hierarchy"),
        )
        .arg(
            Arg::new("widening-threshold")
                .long("widening-threshold")
                .value_name("VISITS")
                .value_parser(value_parser!(usize))
                .help("Visits to a block after which changing types widen to `top`"),
        )
        .arg(
            Arg::new("INPUT")
                .help("Sets the input listing to use (`-` for standard input)")
                .required(true)
                .index(1),
        )
        .get_matches();

    let mut settings = Settings::new(if matches.get_flag("maxes-only") {
        Compute::Maxes
    } else {
        Compute::Frames
    });
    if let Some(widening_threshold) = matches.get_one::<usize>("widening-threshold") {
        settings.widening_threshold = *widening_threshold;
    }

    let input = matches
        .get_one::<String>("INPUT")
        .map(String::as_str)
        .unwrap_or("-");
    let source = if input == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        source
    } else {
        log::info!("Reading '{}'", input);
        fs::read_to_string(input)?
    };
    let mut listing = listing::parse(&source)?;

    let class_graph_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_graph_arenas);
    if !matches.get_flag("no-runtime-classes") {
        class_graph.insert_java_library_types();
    }
    listing.declare_in(&class_graph);

    listing.recompute_all(Some(&class_graph), &settings)?;

    let mut stdout = io::stdout().lock();
    write!(stdout, "{}", listing)?;
    Ok(())
}
