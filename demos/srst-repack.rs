use std::fs::{self, File};

use srst::{Srst, SrstBuilder};

pub fn main() {
    let mut args = std::env::args().skip(1);
    let src = args.next().expect("source file");
    let index: usize = args
        .next()
        .expect("entry index")
        .parse()
        .expect("entry index is not a number");
    let kns = args.next().expect("replacement kns file");
    let dest = args.next().expect("dest file");
    let data = fs::read(src).unwrap();
    let srst = Srst::parse(&data).unwrap();
    let mut builder = SrstBuilder::from_srst(&srst).unwrap();
    builder
        .replace_payload(index, fs::read(kns).unwrap())
        .expect("entry index out of range");
    builder
        .write_srst(&mut File::create(dest).unwrap())
        .unwrap();
}
