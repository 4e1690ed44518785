use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Carriage return, then erase the whole line.
pub const CLEAR_LINE: &str = "\r\x1b[2K";

/// Somewhere to show the latest uptime text. Each call replaces the previous
/// content.
pub trait TextSink: Send {
    fn set_text(&mut self, text: &str) -> io::Result<()>;
}

impl<S: TextSink + ?Sized> TextSink for Box<S> {
    fn set_text(&mut self, text: &str) -> io::Result<()> {
        (**self).set_text(text)
    }
}

/// Writes to standard output, either redrawing a single line in place or
/// appending one line per update.
#[derive(Debug)]
pub struct StdoutSink {
    rewrite: bool,
}

impl StdoutSink {
    pub fn new(rewrite: bool) -> Self {
        StdoutSink { rewrite }
    }
}

impl TextSink for StdoutSink {
    fn set_text(&mut self, text: &str) -> io::Result<()> {
        let stdout = io::stdout();
        write_text(&mut stdout.lock(), self.rewrite, text)
    }
}

fn write_text<W: Write>(out: &mut W, rewrite: bool, text: &str) -> io::Result<()> {
    if rewrite {
        write!(out, "{}{}", CLEAR_LINE, text)?;
    } else {
        writeln!(out, "{}", text)?;
    }
    out.flush()
}

/// Keeps a file holding just the latest text, for status bars that poll it.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl FileSink {
    pub fn new(path: &Path) -> io::Result<Self> {
        let tmp_filename = path
            .file_name()
            .map(|file_name| {
                let mut tmp_name = file_name.to_os_string();
                tmp_name.push(".tmp");
                tmp_name
            })
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "file_name is None"))?;

        Ok(FileSink {
            path: path.to_path_buf(),
            tmp_path: path.with_file_name(tmp_filename),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextSink for FileSink {
    fn set_text(&mut self, text: &str) -> io::Result<()> {
        fs::write(&self.tmp_path, text)?;
        fs::rename(&self.tmp_path, &self.path)
    }
}
