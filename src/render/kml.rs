/// Max-elevation KML writer
///
/// One `<Placemark>` per triangle with an unoutlined, semi-transparent
/// polygon style, in the layout the surge website already consumes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::model::{Result, SurgeError};
use crate::render::{ColoredPolygon, PolygonSink};

const HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<kml xmlns=\"http://earth.google.com/kml/2.0\"> <Document>\n";
const FOOTER: &str = "</Document> </kml>";

/// `maxelev_<typhoon>_<event>_<max surge>_<province>.kml`, or `temp.kml`
/// when neither a typhoon name nor an event id is known.
pub fn file_name(typhoon: &str, event_id: &str, max_surge_id: &str, province: &str) -> String {
    if typhoon.is_empty() && event_id.is_empty() {
        return "temp.kml".to_string();
    }
    format!("maxelev_{}_{}_{}_{}.kml", typhoon, event_id, max_surge_id, province)
}

pub struct KmlWriter<W: Write> {
    out: W,
    /// Where `out` writes to, for error messages.
    target: PathBuf,
    started: bool,
}

impl<W: Write> KmlWriter<W> {
    pub fn new(out: W, target: impl Into<PathBuf>) -> Self {
        Self {
            out,
            target: target.into(),
            started: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn io(&self, e: std::io::Error) -> SurgeError {
        SurgeError::io(&self.target, e)
    }

    fn start(&mut self) -> Result<()> {
        if !self.started {
            self.out.write_all(HEADER.as_bytes()).map_err(|e| self.io(e))?;
            self.started = true;
        }
        Ok(())
    }
}

impl KmlWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| SurgeError::io(path, e))?;
        Ok(Self::new(BufWriter::new(file), path))
    }
}

impl<W: Write> PolygonSink for KmlWriter<W> {
    fn add_polygon(&mut self, polygon: &ColoredPolygon) -> Result<()> {
        self.start()?;
        let mut text = String::from("<Placemark>\n <Polygon> <outerBoundaryIs>  <LinearRing>  \n  <coordinates>\n");
        for p in &polygon.ring {
            text.push_str(&format!("     {},{}\n", p.lon, p.lat));
        }
        text.push_str("  </coordinates>\n </LinearRing> </outerBoundaryIs> </Polygon>\n");
        text.push_str(" <Style>\n  <PolyStyle>\n");
        text.push_str(&format!("   <color>{}</color>\n", polygon.color.kml(polygon.alpha)));
        text.push_str("  <outline>0</outline>\n  </PolyStyle>\n </Style>\n</Placemark>\n");
        self.out.write_all(text.as_bytes()).map_err(|e| self.io(e))
    }

    fn finish(&mut self) -> Result<()> {
        self.start()?;
        self.out.write_all(FOOTER.as_bytes()).map_err(|e| self.io(e))?;
        self.out.flush().map_err(|e| self.io(e))
    }
}
