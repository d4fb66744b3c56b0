use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use std::process;

use clap::{App, Arg, ArgMatches};

use replay_mpq::Archive;

fn main() {
    let matches = App::new("replay-mpq")
        .about("views and extracts files from MoPaQ replay archives")
        .arg(
            Arg::with_name("archive")
                .index(1)
                .value_name("archive")
                .help("archive file to read")
                .required(true),
        )
        .arg(
            Arg::with_name("headers")
                .short("I")
                .help("print the archive headers"),
        )
        .arg(
            Arg::with_name("hash-table")
                .short("H")
                .help("print the hash table"),
        )
        .arg(
            Arg::with_name("block-table")
                .short("b")
                .help("print the block table"),
        )
        .arg(
            Arg::with_name("skip-listfile")
                .short("s")
                .help("do not read the (listfile)"),
        )
        .arg(
            Arg::with_name("list")
                .short("t")
                .help("list the files in the archive"),
        )
        .arg(
            Arg::with_name("extract")
                .short("x")
                .help("extract all listed files to disk"),
        )
        .get_matches();

    if let Err(error) = run(&matches) {
        eprintln!("error: {}", error);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn StdError>> {
    let path = matches.value_of("archive").unwrap();
    let with_listfile = !matches.is_present("skip-listfile");
    let archive = Archive::open(path, with_listfile)?;

    if matches.is_present("headers") {
        print_headers(&archive);
    }
    if matches.is_present("hash-table") {
        print_hash_table(&archive);
    }
    if matches.is_present("block-table") {
        print_block_table(&archive);
    }
    if matches.is_present("list") {
        let files = archive.files().ok_or("archive has no listfile")?;
        for name in files {
            println!("{}", name);
        }
    }
    if matches.is_present("extract") {
        extract(&archive, path)?;
    }

    Ok(())
}

fn print_headers(archive: &Archive) {
    let header = archive.header();

    if let Some(user_data) = &header.user_data {
        println!("user data header");
        println!("----------------");
        println!("{:<28} {}", "user_data_size", user_data.user_data_size);
        println!("{:<28} {}", "mpq_header_offset", user_data.mpq_header_offset);
        println!(
            "{:<28} {}",
            "user_data_header_size", user_data.user_data_header_size
        );
        println!();
    }

    println!("archive header");
    println!("--------------");
    println!("{:<28} {}", "offset", header.offset);
    println!("{:<28} {}", "header_size", header.header_size);
    println!("{:<28} {}", "archive_size", header.archive_size);
    println!("{:<28} {}", "format_version", header.format_version);
    println!("{:<28} {}", "sector_size_shift", header.sector_size_shift);
    println!("{:<28} {}", "hash_table_offset", header.hash_table_offset);
    println!("{:<28} {}", "block_table_offset", header.block_table_offset);
    println!("{:<28} {}", "hash_table_entries", header.hash_table_entries);
    println!("{:<28} {}", "block_table_entries", header.block_table_entries);
    if header.format_version == 1 {
        println!(
            "{:<28} {}",
            "extended_block_table_offset", header.extended_block_table_offset
        );
        println!(
            "{:<28} {}",
            "hash_table_offset_high", header.hash_table_offset_high
        );
        println!(
            "{:<28} {}",
            "block_table_offset_high", header.block_table_offset_high
        );
    }
    println!();
}

fn print_hash_table(archive: &Archive) {
    println!("hash table");
    println!("----------");
    println!(" hash_a   hash_b   locl plat block");
    for entry in archive.hash_table().entries() {
        println!(
            "{:08X} {:08X} {:04X} {:04X} {:08X}",
            entry.hash_a, entry.hash_b, entry.locale, entry.platform, entry.block_index
        );
    }
    println!();
}

fn print_block_table(archive: &Archive) {
    println!("block table");
    println!("-----------");
    println!("  offset archived_size     size    flags");
    for entry in archive.block_table().entries() {
        println!(
            "{:8} {:13} {:8} {:08X}",
            entry.offset, entry.archived_size, entry.size, entry.flags
        );
    }
    println!();
}

fn extract(archive: &Archive, path: &str) -> Result<(), Box<dyn StdError>> {
    let target = Path::new(path)
        .file_stem()
        .ok_or("cannot derive an output directory from the archive path")?;

    fs::create_dir_all(target)?;

    for (name, contents) in archive.extract_all()? {
        if let Some(contents) = contents {
            fs::write(Path::new(target).join(&name), contents)?;
        }
    }

    Ok(())
}
