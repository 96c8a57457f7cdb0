/// ADCIRC file readers
///
/// Parses the plain-text ADCIRC formats the surge model writes:
///
/// - fort.14   grid: title, `NE NP`, node table, element table
/// - maxele.63 maximum elevation per node (first dataset only)
/// - fort.63   elevation time series, streamed one dataset at a time
/// - fort.15   model parameters; only the meteorological start line is used
///
/// Dataset files share one layout: a header line, `NDSETS NP DT NSPOOL
/// IRTYPE`, then per dataset a record line `TIME IT` followed by `NP` lines
/// `j value`. Sparse records carry `TIME IT NNONDEFAULT DEFAULT` and list
/// only the nodes that differ from the default.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};

use crate::geometry::Point;
use crate::ingest::{ElevationSource, MeshSource, Snapshot, TimeSeriesSource};
use crate::model::{Mesh, MeshNode, Result, SurgeError, Triangle};

// ============================================================================
// Line cursor
// ============================================================================

/// Line-numbered reader that turns I/O failures and premature EOF into
/// crate errors naming the file.
struct LineCursor<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
    origin: String,
}

impl<R: BufRead> LineCursor<R> {
    fn new(reader: R, origin: &str) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            origin: origin.to_string(),
        }
    }

    /// Next line, or `None` at end of input.
    fn try_next(&mut self) -> Result<Option<String>> {
        match self.lines.next() {
            None => Ok(None),
            Some(Err(e)) => Err(SurgeError::io(&self.origin, e)),
            Some(Ok(line)) => {
                self.line_no += 1;
                Ok(Some(line))
            }
        }
    }

    fn next_line(&mut self, expecting: &str) -> Result<String> {
        self.try_next()?
            .ok_or_else(|| self.error(format!("unexpected end of file, expected {}", expecting)))
    }

    fn next_fields(&mut self, expecting: &str, min_fields: usize) -> Result<Vec<String>> {
        let line = self.next_line(expecting)?;
        let fields: Vec<String> = line.split_whitespace().map(String::from).collect();
        if fields.len() < min_fields {
            return Err(self.error(format!(
                "expected {} with at least {} fields, got '{}'",
                expecting,
                min_fields,
                line.trim()
            )));
        }
        Ok(fields)
    }

    fn error(&self, message: impl Into<String>) -> SurgeError {
        SurgeError::malformed(&self.origin, self.line_no, message)
    }

    fn parse_f64(&self, field: &str, what: &str) -> Result<f64> {
        // Fortran output sometimes uses D exponents.
        field
            .replace(['D', 'd'], "E")
            .parse::<f64>()
            .map_err(|_| self.error(format!("invalid {} '{}'", what, field)))
    }

    fn parse_usize(&self, field: &str, what: &str) -> Result<usize> {
        field
            .parse::<usize>()
            .map_err(|_| self.error(format!("invalid {} '{}'", what, field)))
    }
}

fn origin_of(path: &Path) -> String {
    path.display().to_string()
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| SurgeError::io(path, e))
}

// ============================================================================
// fort.14
// ============================================================================

/// Parses an ADCIRC grid. Boundary tables after the elements are ignored.
pub fn parse_fort14<R: BufRead>(reader: R, origin: &str) -> Result<Mesh> {
    let mut cur = LineCursor::new(reader, origin);

    let title = cur.next_line("grid title")?.trim().to_string();
    let counts = cur.next_fields("element and node counts", 2)?;
    let element_count = cur.parse_usize(&counts[0], "element count")?;
    let node_count = cur.parse_usize(&counts[1], "node count")?;

    let mut nodes = Vec::with_capacity(node_count);
    for expected in 1..=node_count {
        let f = cur.next_fields("node record", 4)?;
        let number = cur.parse_usize(&f[0], "node number")?;
        if number != expected {
            return Err(cur.error(format!("node {} out of order, expected {}", number, expected)));
        }
        let lon = cur.parse_f64(&f[1], "x coordinate")?;
        let lat = cur.parse_f64(&f[2], "y coordinate")?;
        let depth = cur.parse_f64(&f[3], "depth")?;
        nodes.push(MeshNode {
            position: Point::new(lon, lat),
            depth,
        });
    }

    let mut triangles = Vec::with_capacity(element_count);
    for _ in 0..element_count {
        let f = cur.next_fields("element record", 5)?;
        let sides = cur.parse_usize(&f[1], "vertex count")?;
        if sides != 3 {
            return Err(cur.error(format!("only triangular elements are supported, got {}", sides)));
        }
        let mut vertices = [0usize; 3];
        for (slot, field) in vertices.iter_mut().zip(&f[2..5]) {
            let n = cur.parse_usize(field, "element vertex")?;
            if n == 0 || n > node_count {
                return Err(cur.error(format!("element refers to missing node {}", n)));
            }
            *slot = n;
        }
        triangles.push(Triangle(vertices));
    }

    Ok(Mesh {
        title,
        nodes,
        triangles,
    })
}

/// fort.14 on disk.
pub struct Fort14File {
    pub path: PathBuf,
}

impl Fort14File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MeshSource for Fort14File {
    fn load_mesh(&mut self) -> Result<Mesh> {
        parse_fort14(open(&self.path)?, &origin_of(&self.path))
    }
}

// ============================================================================
// Dataset files (maxele.63 / fort.63)
// ============================================================================

/// Header values shared by the elevation dataset files.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetHeader {
    pub description: String,
    pub dataset_count: usize,
    pub node_count: usize,
}

fn read_header<R: BufRead>(cur: &mut LineCursor<R>) -> Result<DatasetHeader> {
    let description = cur.next_line("run description")?.trim().to_string();
    let f = cur.next_fields("dataset and node counts", 2)?;
    Ok(DatasetHeader {
        description,
        dataset_count: cur.parse_usize(&f[0], "dataset count")?,
        node_count: cur.parse_usize(&f[1], "node count")?,
    })
}

/// Reads one dataset. Returns `None` if the input ends before its record line.
fn read_dataset<R: BufRead>(cur: &mut LineCursor<R>, node_count: usize) -> Result<Option<Snapshot>> {
    let record = loop {
        match cur.try_next()? {
            None => return Ok(None),
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => break line,
        }
    };
    let f: Vec<&str> = record.split_whitespace().collect();
    if f.len() < 2 {
        return Err(cur.error(format!("expected 'TIME IT' record line, got '{}'", record.trim())));
    }
    let elapsed_seconds = cur.parse_f64(f[0], "record time")?;
    // Some writers emit the step as a float.
    let timestep = cur.parse_f64(f[1], "time step")? as u64;

    let (listed, default) = if f.len() >= 4 {
        let listed = cur.parse_usize(f[2], "non-default count")?;
        let default = cur.parse_f64(f[3], "default value")?;
        (listed, default)
    } else {
        (node_count, f64::NAN)
    };

    let mut values = vec![default; node_count];
    for _ in 0..listed {
        let v = cur.next_fields("node value", 2)?;
        let number = cur.parse_usize(&v[0], "node number")?;
        if number == 0 || number > node_count {
            return Err(cur.error(format!("value for missing node {}", number)));
        }
        values[number - 1] = cur.parse_f64(&v[1], "elevation")?;
    }
    if let Some(pos) = values.iter().position(|v| v.is_nan()) {
        return Err(cur.error(format!("no value given for node {}", pos + 1)));
    }

    Ok(Some(Snapshot {
        elapsed_seconds,
        timestep,
        values,
    }))
}

/// Parses the first dataset of a maxele.63 file.
pub fn parse_maxele63<R: BufRead>(reader: R, origin: &str) -> Result<Vec<f64>> {
    let mut cur = LineCursor::new(reader, origin);
    let header = read_header(&mut cur)?;
    read_dataset(&mut cur, header.node_count)?
        .map(|s| s.values)
        .ok_or_else(|| cur.error("file holds no dataset"))
}

/// maxele.63 on disk.
pub struct Maxele63File {
    pub path: PathBuf,
}

impl Maxele63File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ElevationSource for Maxele63File {
    fn load_max_elevations(&mut self) -> Result<Vec<f64>> {
        parse_maxele63(open(&self.path)?, &origin_of(&self.path))
    }
}

/// Streams a fort.63 time series one dataset at a time.
///
/// Stops after the header's dataset count even if the file goes on.
pub struct Fort63Reader<R: BufRead> {
    cur: LineCursor<R>,
    header: DatasetHeader,
    reference_time: DateTime<Utc>,
    datasets_read: usize,
}

impl<R: BufRead> Fort63Reader<R> {
    /// Reads the header; datasets are read lazily by `next_snapshot`.
    pub fn new(reader: R, origin: &str, reference_time: DateTime<Utc>) -> Result<Self> {
        let mut cur = LineCursor::new(reader, origin);
        let header = read_header(&mut cur)?;
        Ok(Self {
            cur,
            header,
            reference_time,
            datasets_read: 0,
        })
    }

    pub fn header(&self) -> &DatasetHeader {
        &self.header
    }
}

impl Fort63Reader<BufReader<File>> {
    pub fn open(path: &Path, reference_time: DateTime<Utc>) -> Result<Self> {
        Self::new(open(path)?, &origin_of(path), reference_time)
    }
}

impl<R: BufRead> TimeSeriesSource for Fort63Reader<R> {
    fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    fn next_snapshot(&mut self) -> Result<Option<Snapshot>> {
        if self.datasets_read >= self.header.dataset_count {
            return Ok(None);
        }
        let snapshot = read_dataset(&mut self.cur, self.header.node_count)?;
        if snapshot.is_some() {
            self.datasets_read += 1;
        }
        Ok(snapshot)
    }
}

// ============================================================================
// fort.15
// ============================================================================

/// Finds the meteorological start line (`YYYY MM DD HH ...`) in fort.15.
pub fn parse_reference_time<R: BufRead>(reader: R, origin: &str) -> Result<DateTime<Utc>> {
    let mut cur = LineCursor::new(reader, origin);
    while let Some(line) = cur.try_next()? {
        if let Some(t) = start_time_from_line(&line) {
            return Ok(t);
        }
    }
    Err(SurgeError::malformed(origin, 0, "no 'YYYY MM DD HH' start line found"))
}

pub fn read_reference_time(path: &Path) -> Result<DateTime<Utc>> {
    parse_reference_time(open(path)?, &origin_of(path))
}

fn start_time_from_line(line: &str) -> Option<DateTime<Utc>> {
    let mut tokens = line.split_whitespace();
    let year_token = tokens.next()?;
    if year_token.len() != 4 {
        return None;
    }
    let year: i32 = year_token.parse().ok()?;
    let month: u32 = tokens.next()?.parse().ok()?;
    let day: u32 = tokens.next()?.parse().ok()?;
    let hour: u32 = tokens.next()?.parse().ok()?;
    if !(1900..=2200).contains(&year) {
        return None;
    }
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).single()
}

// ============================================================================
// Tests
// ============================================================================
