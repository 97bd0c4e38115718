use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;

use cdesynth_core::ResponseValue;

/// Write a dataset to `path`, one column per header variable in order.
/// Returns the number of bytes written.
pub fn write_dataset_csv(
    path: &Path,
    header: &[String],
    rows: &[IndexMap<String, ResponseValue>],
) -> Result<u64, csv::Error> {
    let file = File::create(path)?;
    write_dataset(BufWriter::new(file), header, rows)
}

/// Same as [`write_dataset_csv`] for any writer.
pub fn write_dataset<W: Write>(
    sink: W,
    header: &[String],
    rows: &[IndexMap<String, ResponseValue>],
) -> Result<u64, csv::Error> {
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(ByteTally { sink, total: 0 });

    out.write_record(header)?;
    let mut cells = Vec::with_capacity(header.len());
    for row in rows {
        cells.clear();
        cells.extend(
            header
                .iter()
                .map(|variable| row.get(variable).map(ResponseValue::to_csv).unwrap_or_default()),
        );
        out.write_record(&cells)?;
    }

    out.flush()?;
    let tally = out.into_inner().map_err(|err| err.into_error())?;
    Ok(tally.total)
}

struct ByteTally<W> {
    sink: W,
    total: u64,
}

impl<W: Write> Write for ByteTally<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.sink.write(buf)?;
        self.total += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_order_and_counts_bytes() {
        let header = vec!["b".to_string(), "a".to_string()];
        let mut row = IndexMap::new();
        row.insert("a".to_string(), ResponseValue::Int(1));
        row.insert("b".to_string(), ResponseValue::Text("x,y".to_string()));

        let mut buffer = Vec::new();
        let bytes = write_dataset(&mut buffer, &header, &[row]).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(text, "b,a\n\"x,y\",1\n");
        assert_eq!(bytes, text.len() as u64);
    }
}
