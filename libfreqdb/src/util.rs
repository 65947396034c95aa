use std::{
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use bzip2::{read::BzDecoder, write::BzEncoder, Compression};

/// Characters besides digits and ASCII punctuation that carry no lexical content.
const SYMBOLS: &str = "„“‟”’‚‘❝❞❛❜〝〞〟＂«»‹›–—―…•·§¶°±×÷¤€£¥¢©®™†‡‰′″¡¿";

/// Czech letters accepted by the exporter on top of ASCII alphanumerics.
const EXPORT_LETTERS: &str = "áÁéÉěĚšŠčČřŘžŽýÝíÍúÚůŮťŤďĎňŇóÓ";

/// Delimiters separating a lemma from lemmatizer annotations.
const BASE_FORM_DELIMITERS: [char; 3] = ['-', '_', '`'];

pub fn open_input(filename: impl AsRef<Path>) -> io::Result<Box<dyn BufRead + Send>> {
    let filename = filename.as_ref();
    let file = OpenOptions::new().read(true).open(filename)?;
    let is_bzip2 = filename
        .extension()
        .map(|s| s.to_string_lossy().as_ref() == "bz2")
        .unwrap_or_default();
    if is_bzip2 {
        Ok(Box::new(BufReader::new(BzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// File target, optionally bzip2-compressed. Call [`Output::finish`] to
/// write the compressed trailer.
pub enum Output {
    Plain(BufWriter<File>),
    Bzip2(BzEncoder<BufWriter<File>>),
}

impl Output {
    pub fn finish(self) -> io::Result<()> {
        match self {
            Output::Plain(mut writer) => writer.flush(),
            Output::Bzip2(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Plain(writer) => writer.write(buf),
            Output::Bzip2(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Plain(writer) => writer.flush(),
            Output::Bzip2(encoder) => encoder.flush(),
        }
    }
}

pub fn open_output(filename: impl AsRef<Path>, compress: bool) -> io::Result<Output> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(filename)?;
    let writer = BufWriter::new(file);
    if compress {
        Ok(Output::Bzip2(BzEncoder::new(writer, Compression::default())))
    } else {
        Ok(Output::Plain(writer))
    }
}

/// A token without lexical content: absent, empty, or made only of digits,
/// punctuation and symbols.
pub fn is_stop_token(token: Option<&str>) -> bool {
    fn is_non_lexical(c: char) -> bool {
        c.is_numeric() || c.is_ascii_punctuation() || SYMBOLS.contains(c)
    }

    match token {
        None => true,
        Some(s) => s.chars().all(is_non_lexical),
    }
}

/// A space-delimited unit is a stop unit as soon as one of its tokens is.
pub fn is_stop_unit(unit: &str) -> bool {
    unit.split(' ').any(|token| is_stop_token(Some(token)))
}

pub fn is_proper_name(lemma: &str) -> bool {
    lemma.chars().next().map(char::is_uppercase).unwrap_or_default()
}

/// Strips lemmatizer annotations, e.g. `pes_^(zvíře)` becomes `pes`.
pub fn base_form(lemma: &str) -> &str {
    lemma.split(&BASE_FORM_DELIMITERS[..]).next().unwrap_or(lemma)
}

pub fn is_exportable_lemma(lemma: &str) -> bool {
    !lemma.is_empty()
        && lemma.chars().all(|c| {
            c.is_whitespace() || c.is_ascii_alphanumeric() || c == '-' || EXPORT_LETTERS.contains(c)
        })
}
