use crate::error::{DlaError, Result};
use crate::grid::Grid;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
const NPY_ALIGN: usize = 64;

/// Serialize the grid as a NumPy v1.0 `.npy` array: shape `(M, M)`, `<f8`,
/// C order, 1.0 for occupied cells.
pub fn encode_npy(grid: &Grid) -> Vec<u8> {
    let m = grid.size();
    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
        m, m
    );
    // magic + version + u16 length + header + trailing newline, padded to alignment
    let unpadded = NPY_MAGIC.len() + 2 + 2 + header.len() + 1;
    let padding = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
    header.push_str(&" ".repeat(padding));
    header.push('\n');

    let mut out = Vec::with_capacity(unpadded + padding + m * m * 8);
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for &cell in grid.cells() {
        let value: f64 = if cell { 1.0 } else { 0.0 };
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Element types accepted when reading `.npy` files
#[derive(Debug, Clone, Copy, PartialEq)]
enum Dtype {
    F8,
    F4,
    I8,
    I4,
    U1,
    Bool,
}

impl Dtype {
    fn parse(descr: &str) -> Option<Self> {
        match descr {
            "<f8" => Some(Dtype::F8),
            "<f4" => Some(Dtype::F4),
            "<i8" => Some(Dtype::I8),
            "<i4" => Some(Dtype::I4),
            "|u1" => Some(Dtype::U1),
            "|b1" => Some(Dtype::Bool),
            _ => None,
        }
    }

    fn width(&self) -> usize {
        match self {
            Dtype::F8 | Dtype::I8 => 8,
            Dtype::F4 | Dtype::I4 => 4,
            Dtype::U1 | Dtype::Bool => 1,
        }
    }

    fn is_nonzero(&self, b: &[u8]) -> bool {
        match self {
            Dtype::F8 => f64::from_le_bytes(b.try_into().unwrap_or([0; 8])) != 0.0,
            Dtype::F4 => f32::from_le_bytes(b.try_into().unwrap_or([0; 4])) != 0.0,
            Dtype::I8 | Dtype::I4 | Dtype::U1 | Dtype::Bool => b.iter().any(|&v| v != 0),
        }
    }
}

fn header_value<'a>(header: &'a str, key: &str) -> Result<&'a str> {
    let pattern = format!("'{}':", key);
    let start = header
        .find(&pattern)
        .ok_or_else(|| DlaError::Npy(format!("header has no '{}' entry", key)))?;
    Ok(header[start + pattern.len()..].trim_start())
}

/// Read a square 2-D `.npy` array back into a grid; any nonzero element is occupied
pub fn decode_npy(bytes: &[u8]) -> Result<Grid> {
    if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
        return Err(DlaError::Npy("missing NUMPY magic".into()));
    }
    let (header_len, header_start) = match bytes[6] {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 if bytes.len() >= 12 => (
            u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
            12,
        ),
        v => return Err(DlaError::Npy(format!("unsupported format version {}", v))),
    };
    let data_start = header_start + header_len;
    let header = bytes
        .get(header_start..data_start)
        .and_then(|h| std::str::from_utf8(h).ok())
        .ok_or_else(|| DlaError::Npy("truncated header".into()))?;

    let descr = header_value(header, "descr")?;
    let descr = descr
        .strip_prefix('\'')
        .and_then(|d| d.split('\'').next())
        .ok_or_else(|| DlaError::Npy("unquoted descr".into()))?;
    let dtype = Dtype::parse(descr).ok_or_else(|| DlaError::Npy(format!("unsupported dtype {}", descr)))?;

    if header_value(header, "fortran_order")?.starts_with("True") {
        return Err(DlaError::Npy("fortran-ordered arrays are not supported".into()));
    }

    let shape = header_value(header, "shape")?;
    let shape = shape
        .strip_prefix('(')
        .and_then(|s| s.split(')').next())
        .ok_or_else(|| DlaError::Npy("malformed shape".into()))?;
    let dims: Vec<usize> = shape
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| DlaError::Npy(format!("bad shape dimension: {}", e)))?;
    let (rows, cols) = match dims.as_slice() {
        [r, c] => (*r, *c),
        _ => return Err(DlaError::Npy(format!("expected a 2-D array, got shape {:?}", dims))),
    };
    if rows != cols {
        return Err(DlaError::NotSquare { rows, cols });
    }

    let width = dtype.width();
    let count = rows
        .checked_mul(cols)
        .ok_or_else(|| DlaError::Npy(format!("shape ({}, {}) is too large", rows, cols)))?;
    let expected = count
        .checked_mul(width)
        .ok_or_else(|| DlaError::Npy(format!("shape ({}, {}) is too large", rows, cols)))?;
    let data = &bytes[data_start..];
    if data.len() < expected {
        return Err(DlaError::Npy(format!(
            "expected {} data bytes, found {}",
            expected,
            data.len()
        )));
    }
    let cells = data
        .chunks_exact(width)
        .take(count)
        .map(|b| dtype.is_nonzero(b))
        .collect();
    Grid::from_cells(rows, cells).ok_or_else(|| DlaError::Npy("cell count mismatch".into()))
}

pub fn save_npy(grid: &Grid, path: &Path) -> Result<()> {
    fs::write(path, encode_npy(grid))?;
    Ok(())
}

pub fn load_npy(path: &Path) -> Result<Grid> {
    decode_npy(&fs::read(path)?)
}

/// Human-readable grid file: one string per row, `#` for occupied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDocument {
    pub size: usize,
    pub rows: Vec<String>,
}

impl From<&Grid> for GridDocument {
    fn from(grid: &Grid) -> Self {
        Self {
            size: grid.size(),
            rows: grid
                .rows()
                .map(|row| row.iter().map(|&c| if c { '#' } else { '.' }).collect())
                .collect(),
        }
    }
}

impl TryFrom<GridDocument> for Grid {
    type Error = DlaError;

    fn try_from(doc: GridDocument) -> Result<Grid> {
        let rows: Vec<Vec<bool>> = doc
            .rows
            .iter()
            .map(|r| r.chars().map(|c| c == '#').collect())
            .collect();
        match Grid::from_rows(&rows) {
            Some(grid) if grid.size() == doc.size => Ok(grid),
            _ => Err(DlaError::NotSquare {
                rows: rows.len(),
                cols: rows.first().map_or(0, |r| r.len()),
            }),
        }
    }
}

pub fn save_json(grid: &Grid, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&GridDocument::from(grid))?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_json(path: &Path) -> Result<Grid> {
    let content = fs::read_to_string(path)?;
    let doc: GridDocument = serde_json::from_str(&content)?;
    Grid::try_from(doc)
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Save to `.npy` or `.json`, chosen by extension
pub fn save_grid(grid: &Grid, path: &Path) -> Result<()> {
    match extension(path).as_str() {
        "npy" => save_npy(grid, path),
        "json" => save_json(grid, path),
        other => Err(DlaError::UnknownFormat(other.to_string())),
    }
}

/// Load from `.npy` or `.json`, chosen by extension
pub fn load_grid(path: &Path) -> Result<Grid> {
    match extension(path).as_str() {
        "npy" => load_npy(path),
        "json" => load_json(path),
        other => Err(DlaError::UnknownFormat(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{run, SimulationConfig};
    use tempfile::tempdir;

    fn npy_with(descr: &str, shape: &str, data: &[u8]) -> Vec<u8> {
        let header = format!("{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}\n", descr, shape);
        let mut out = NPY_MAGIC.to_vec();
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn test_npy_header_layout() {
        let bytes = encode_npy(&Grid::new(3));
        assert_eq!(&bytes[..6], NPY_MAGIC);
        assert_eq!(bytes[6], 1);
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!((10 + header_len) % NPY_ALIGN, 0);
        let header = std::str::from_utf8(&bytes[10..10 + header_len]).unwrap();
        assert!(header.starts_with("{'descr': '<f8', 'fortran_order': False, 'shape': (3, 3), }"));
        assert!(header.ends_with('\n'));
        assert_eq!(bytes.len(), 10 + header_len + 9 * 8);
    }

    #[test]
    fn test_npy_round_trip_of_simulated_grid() {
        let grid = run(&SimulationConfig::new(21, 25, 1.0).with_seed(9)).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.npy");
        save_grid(&grid, &path).unwrap();
        assert_eq!(load_grid(&path).unwrap(), grid);
    }

    #[test]
    fn test_npy_reads_other_dtypes() {
        let grid = decode_npy(&npy_with("|u1", "(2, 2)", &[0, 1, 1, 0])).unwrap();
        assert_eq!(grid.to_rows(), vec![vec![false, true], vec![true, false]]);

        let mut data = Vec::new();
        for v in [0i32, 0, 0, 5] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let grid = decode_npy(&npy_with("<i4", "(2, 2)", &data)).unwrap();
        assert!(grid.is_occupied(1, 1));
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn test_npy_rejects_bad_input() {
        assert!(matches!(decode_npy(b"not numpy"), Err(DlaError::Npy(_))));
        assert!(matches!(
            decode_npy(&npy_with("|u1", "(2, 3)", &[0; 6])),
            Err(DlaError::NotSquare { rows: 2, cols: 3 })
        ));
        assert!(matches!(decode_npy(&npy_with("|u1", "(4,)", &[0; 4])), Err(DlaError::Npy(_))));
        assert!(matches!(decode_npy(&npy_with("<c16", "(1, 1)", &[0; 16])), Err(DlaError::Npy(_))));
        assert!(matches!(decode_npy(&npy_with("|u1", "(3, 3)", &[0; 4])), Err(DlaError::Npy(_))));
    }

    #[test]
    fn test_npy_rejects_overflowing_shape() {
        let huge = npy_with("|u1", "(4294967296, 4294967296)", &[0; 4]);
        assert!(matches!(decode_npy(&huge), Err(DlaError::Npy(_))));
        let wide = npy_with("<f8", &format!("({0}, {0})", 1usize << 31), &[0; 8]);
        assert!(matches!(decode_npy(&wide), Err(DlaError::Npy(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let mut grid = Grid::new(4);
        grid.set_occupied(1, 2);
        grid.set_occupied(3, 0);
        let doc = GridDocument::from(&grid);
        assert_eq!(doc.rows[1], "..#.");
        assert_eq!(doc.rows[3], "#...");

        let dir = tempdir().unwrap();
        let path = dir.path().join("grid.json");
        save_grid(&grid, &path).unwrap();
        assert_eq!(load_grid(&path).unwrap(), grid);
    }

    #[test]
    fn test_json_rejects_ragged_rows() {
        let doc = GridDocument {
            size: 2,
            rows: vec!["#.".into(), "#".into()],
        };
        assert!(Grid::try_from(doc).is_err());
    }

    #[test]
    fn test_unknown_extension() {
        let grid = Grid::new(3);
        assert!(matches!(
            save_grid(&grid, Path::new("grid.csv")),
            Err(DlaError::UnknownFormat(ext)) if ext == "csv"
        ));
    }
}
