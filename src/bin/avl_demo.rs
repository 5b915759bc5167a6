//! Builds a tree from a list of keys, reports on it, deletes one key and reports again.
//!
//! ```text
//! avl_demo [KEY ...] [--delete KEY] [--log-level LEVEL]
//! ```
//!
//! Without arguments the keys are `10 20 5 4 15 25` and `10` is deleted.
//! The log level (`off`, `error`, `warn`, `info`, `debug`, `trace`) can also come
//! from `AVL_DEMO_LOG`.

use std::error::Error;

use avl_tree::AvlTree;
use clap::Parser;
use log::{LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

#[derive(Parser, Debug)]
#[command(about = "Builds an AVL tree, reports on it, deletes one key and reports again")]
struct Opts {
    /// Keys to insert, in order.
    #[arg(allow_negative_numbers = true, default_values_t = [10, 20, 5, 4, 15, 25])]
    keys: Vec<i64>,

    /// Key to delete after the first report.
    #[arg(long, allow_negative_numbers = true, default_value_t = 10)]
    delete: i64,

    #[arg(long, env = "AVL_DEMO_LOG", default_value_t = LevelFilter::Warn)]
    log_level: LevelFilter,
}

impl Opts {
    /// The key the search/depth/level lines ask about; 15 for the default keys.
    fn target(&self) -> i64 {
        self.keys[self.keys.len() * 2 / 3]
    }
}

fn yes_no(answer: bool) -> &'static str {
    if answer { "yes" } else { "no" }
}

fn or_missing(value: Option<usize>) -> String {
    value.map_or_else(|| String::from("-1"), |value| value.to_string())
}

fn main() -> Result<(), Box<dyn Error>> {
    let opts = Opts::parse();
    TermLogger::init(opts.log_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;

    let mut tree: AvlTree<i64> = opts.keys.iter().copied().collect();
    info!("built tree of {} keys, height {}", tree.len(), tree.height());

    let target = opts.target();
    let first = opts.keys[0];

    tree.print_ascending();
    tree.print_descending();
    println!("Search {target}: {}", yes_no(tree.search(&target)));
    println!("Height {first}: {}", or_missing(tree.height_of(&first)));
    println!("Depth {target}: {}", or_missing(tree.depth_of(&target)));
    println!("Level {target}: {}", or_missing(tree.level_of(&target)));
    println!("Valid AVL: {}", yes_no(tree.is_valid_avl()));

    println!("Delete {}", opts.delete);
    if !tree.delete(&opts.delete) {
        info!("{} was not in the tree", opts.delete);
    }
    tree.print_ascending();
    println!("Valid AVL: {}", yes_no(tree.is_valid_avl()));

    tree.validate()?;
    Ok(())
}
