use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use srst::ExtractedPayload;

/// `<prefix>.<index>.kns`, the index isn't padded
pub fn kns_path(prefix: &Path, index: u32) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(format!(".{index}.kns"));
    PathBuf::from(name)
}

pub fn write_payload(path: &Path, payload: &ExtractedPayload) -> io::Result<()> {
    let mut out_file = BufWriter::new(File::create(path)?);
    payload.write_to(&mut out_file)?;
    out_file.flush()
}

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use super::kns_path;

    #[test]
    pub fn names_are_not_padded() {
        assert_eq!(
            kns_path(Path::new("music/0x272c6efb"), 0),
            PathBuf::from("music/0x272c6efb.0.kns")
        );
        assert_eq!(kns_path(Path::new("out"), 12), PathBuf::from("out.12.kns"));
    }

    #[cfg(unix)]
    #[test]
    pub fn prefix_does_not_need_to_be_utf8() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let prefix = Path::new(OsStr::from_bytes(b"music/\xFFsong"));
        let path = kns_path(prefix, 3);
        assert_eq!(path.as_os_str().as_bytes(), b"music/\xFFsong.3.kns");
    }
}
