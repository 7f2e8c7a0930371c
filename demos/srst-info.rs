use std::{env::args, fs};

// print the headers and the entry table of every file
use srst::Srst;

pub fn process_file(filename: &String) -> Result<(), srst::SrstError> {
    let data = fs::read(filename)?;
    let srst = Srst::parse(&data)?;
    println!("{filename}");
    println!("{:?}", srst.header);
    println!("{:?} ({})", srst.ktsr, srst.platform());
    for entry in srst.entries()? {
        let entry = entry?;
        let range = entry.file_range();
        match entry.extract() {
            Ok(payload) => println!(
                "{:4}: {:08X} {:#010x}..{:#010x} KTSS {} bytes",
                entry.index,
                entry.entry_type,
                range.start,
                range.end,
                payload.len()
            ),
            Err(e) => println!(
                "{:4}: {:08X} {:#010x}..{:#010x} {e}",
                entry.index, entry.entry_type, range.start, range.end
            ),
        }
    }
    Ok(())
}

pub fn main() {
    for filename in args().skip(1) {
        if let Err(e) = process_file(&filename) {
            eprintln!("problem with {filename}: {e:?}");
        }
    }
}
