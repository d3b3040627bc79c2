//! # Legacy VTK Label Reader
//!
//! Streams z-planes of labels from a legacy VTK `STRUCTURED_POINTS` file.
//!
//! ## Format
//!
//! ```text
//! # vtk DataFile Version 2.0
//! any title
//! ASCII | BINARY
//! DATASET STRUCTURED_POINTS
//! DIMENSIONS nx ny nz
//! ORIGIN ox oy oz              (optional)
//! SPACING dx dy dz             (or ASPECT_RATIO)
//! POINT_DATA n
//! SCALARS GrainID int 1
//! LOOKUP_TABLE default
//! <n values, x fastest; big-endian in BINARY files>
//! ```
//!
//! The header is parsed completely before any plane is handed out, so a
//! malformed file fails before meshing starts.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use grainmesh_core::{LabelSource, LabelVolume, MeshError, MeshResult, VolumeHeader};

/// Payload encoding of a legacy VTK file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Whitespace-separated decimal text.
    Ascii,
    /// Big-endian binary.
    Binary,
}

/// Scalar type of the label array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarType {
    /// Signed 8-bit.
    Char,
    /// Unsigned 8-bit.
    UnsignedChar,
    /// Signed 16-bit.
    Short,
    /// Unsigned 16-bit.
    UnsignedShort,
    /// Signed 32-bit.
    Int,
    /// Unsigned 32-bit.
    UnsignedInt,
}

impl ScalarType {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "char" => Some(Self::Char),
            "unsigned_char" => Some(Self::UnsignedChar),
            "short" => Some(Self::Short),
            "unsigned_short" => Some(Self::UnsignedShort),
            "int" => Some(Self::Int),
            "unsigned_int" => Some(Self::UnsignedInt),
            _ => None,
        }
    }

    /// Bytes per value in BINARY files.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Char | Self::UnsignedChar => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::UnsignedInt => 4,
        }
    }

    fn decode(self, bytes: &[u8]) -> Option<i32> {
        match self {
            Self::Char => Some(i32::from(i8::from_be_bytes([bytes[0]]))),
            Self::UnsignedChar => Some(i32::from(bytes[0])),
            Self::Short => Some(i32::from(i16::from_be_bytes([bytes[0], bytes[1]]))),
            Self::UnsignedShort => Some(i32::from(u16::from_be_bytes([bytes[0], bytes[1]]))),
            Self::Int => Some(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Self::UnsignedInt => {
                i32::try_from(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])).ok()
            }
        }
    }
}

/// Parsed header of a legacy VTK file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VtkHeader {
    /// Volume geometry.
    pub volume: VolumeHeader,
    /// Payload encoding.
    pub encoding: Encoding,
    /// Scalar type of the labels.
    pub scalar: ScalarType,
}

fn parse_err(source: &Path, message: impl std::fmt::Display) -> MeshError {
    MeshError::Parse(format!("{}: {message}", source.display()))
}

fn parse_triple<T: std::str::FromStr>(
    source: &Path,
    keyword: &str,
    fields: &[&str],
) -> MeshResult<[T; 3]> {
    if fields.len() != 3 {
        return Err(parse_err(source, format!("{keyword} needs 3 values")));
    }
    let mut out = Vec::with_capacity(3);
    for field in fields {
        out.push(
            field
                .parse::<T>()
                .map_err(|_| parse_err(source, format!("bad {keyword} value '{field}'")))?,
        );
    }
    out.try_into()
        .map_err(|_| parse_err(source, format!("{keyword} needs 3 values")))
}

/// Reads and validates the header, leaving `reader` at the first value.
///
/// # Errors
///
/// [`MeshError::Parse`] for any malformed or missing header field and
/// [`MeshError::Io`] for read failures.
pub fn read_header<R: BufRead>(reader: &mut R, source: &Path) -> MeshResult<VtkHeader> {
    let mut line = String::new();
    let mut next_line = |line: &mut String| -> MeshResult<bool> {
        line.clear();
        let n = reader
            .read_line(line)
            .map_err(|e| MeshError::io(source, e))?;
        Ok(n > 0)
    };

    if !next_line(&mut line)? || !line.to_ascii_lowercase().starts_with("# vtk datafile") {
        return Err(parse_err(source, "missing '# vtk DataFile' signature"));
    }
    if !next_line(&mut line)? {
        return Err(parse_err(source, "missing title line"));
    }
    if !next_line(&mut line)? {
        return Err(parse_err(source, "missing encoding line"));
    }
    let encoding = match line.trim().to_ascii_uppercase().as_str() {
        "ASCII" => Encoding::Ascii,
        "BINARY" => Encoding::Binary,
        other => return Err(parse_err(source, format!("unknown encoding '{other}'"))),
    };

    let mut structured = false;
    let mut dims: Option<[usize; 3]> = None;
    let mut spacing: Option<[f64; 3]> = None;
    let mut origin = [0.0; 3];
    let mut point_count: Option<usize> = None;
    let mut scalar: Option<ScalarType> = None;

    loop {
        if !next_line(&mut line)? {
            return Err(parse_err(source, "header ends before LOOKUP_TABLE"));
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some((keyword, rest)) = fields.split_first() else {
            continue;
        };
        match keyword.to_ascii_uppercase().as_str() {
            "DATASET" => {
                if rest.first().map(|s| s.to_ascii_uppercase()).as_deref() != Some("STRUCTURED_POINTS") {
                    return Err(parse_err(source, "only STRUCTURED_POINTS datasets are supported"));
                }
                structured = true;
            }
            "DIMENSIONS" => dims = Some(parse_triple(source, "DIMENSIONS", rest)?),
            "SPACING" | "ASPECT_RATIO" => spacing = Some(parse_triple(source, "SPACING", rest)?),
            "ORIGIN" => origin = parse_triple(source, "ORIGIN", rest)?,
            "POINT_DATA" => {
                let count = rest
                    .first()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| parse_err(source, "bad POINT_DATA count"))?;
                point_count = Some(count);
            }
            "SCALARS" => {
                let kind = rest
                    .get(1)
                    .and_then(|s| ScalarType::parse(s))
                    .ok_or_else(|| parse_err(source, "missing or unsupported SCALARS type"))?;
                if let Some(components) = rest.get(2) {
                    if *components != "1" {
                        return Err(parse_err(source, "labels must have one component"));
                    }
                }
                scalar = Some(kind);
            }
            "LOOKUP_TABLE" => break,
            other => return Err(parse_err(source, format!("unexpected keyword '{other}'"))),
        }
    }

    if !structured {
        return Err(parse_err(source, "missing DATASET STRUCTURED_POINTS"));
    }
    let dims = dims.ok_or_else(|| parse_err(source, "missing DIMENSIONS"))?;
    let spacing = spacing.ok_or_else(|| parse_err(source, "missing SPACING"))?;
    let scalar = scalar.ok_or_else(|| parse_err(source, "missing SCALARS"))?;
    let volume = VolumeHeader::new(dims, spacing, origin);
    if let Some(count) = point_count {
        if count != volume.voxel_count() {
            return Err(parse_err(
                source,
                format!("POINT_DATA {count} disagrees with DIMENSIONS {dims:?}"),
            ));
        }
    }
    volume
        .validate()
        .map_err(|e| parse_err(source, e))?;

    Ok(VtkHeader {
        volume,
        encoding,
        scalar,
    })
}

/// Plane-streaming reader for legacy VTK label files.
pub struct VtkLabelReader<R = BufReader<File>> {
    source: PathBuf,
    reader: R,
    header: VtkHeader,
    next_plane: usize,
    line: String,
    cursor: usize,
    bytes: Vec<u8>,
}

impl VtkLabelReader {
    /// Opens a file and parses its header.
    ///
    /// # Errors
    ///
    /// [`MeshError::Io`] if the file cannot be opened and
    /// [`MeshError::Parse`] for a malformed header.
    pub fn open(path: impl AsRef<Path>) -> MeshResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MeshError::io(path, e))?;
        let reader = Self::from_reader(BufReader::new(file), path)?;
        tracing::info!(
            path = %path.display(),
            dims = ?reader.header.volume.dims,
            encoding = ?reader.header.encoding,
            "opened label volume"
        );
        Ok(reader)
    }
}

impl<R: BufRead> VtkLabelReader<R> {
    /// Wraps an already-open reader; `source` only names it in errors.
    ///
    /// # Errors
    ///
    /// [`MeshError::Parse`] for a malformed header.
    pub fn from_reader(mut reader: R, source: impl Into<PathBuf>) -> MeshResult<Self> {
        let source = source.into();
        let header = read_header(&mut reader, &source)?;
        Ok(Self {
            source,
            reader,
            header,
            next_plane: 0,
            line: String::new(),
            cursor: 0,
            bytes: Vec::new(),
        })
    }

    /// Parsed header.
    #[must_use]
    pub const fn vtk_header(&self) -> &VtkHeader {
        &self.header
    }

    fn next_ascii(&mut self) -> MeshResult<i32> {
        loop {
            let rest = &self.line[self.cursor..];
            let trimmed = rest.trim_start();
            if !trimmed.is_empty() {
                let start = self.cursor + (rest.len() - trimmed.len());
                let len = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
                self.cursor = start + len;
                let token = &self.line[start..start + len];
                return token
                    .parse::<i32>()
                    .map_err(|_| parse_err(&self.source, format!("bad label '{token}'")));
            }
            self.line.clear();
            self.cursor = 0;
            let n = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| MeshError::io(&self.source, e))?;
            if n == 0 {
                return Err(parse_err(
                    &self.source,
                    format!("data ends inside plane {}", self.next_plane),
                ));
            }
        }
    }

    fn read_binary(&mut self, out: &mut [i32]) -> MeshResult<()> {
        let size = self.header.scalar.size();
        self.bytes.resize(out.len() * size, 0);
        self.reader.read_exact(&mut self.bytes).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                parse_err(&self.source, format!("data ends inside plane {}", self.next_plane))
            } else {
                MeshError::io(&self.source, e)
            }
        })?;
        for (value, chunk) in out.iter_mut().zip(self.bytes.chunks_exact(size)) {
            *value = self
                .header
                .scalar
                .decode(chunk)
                .ok_or_else(|| parse_err(&self.source, "label exceeds 32-bit range"))?;
        }
        Ok(())
    }
}

impl<R: BufRead> LabelSource for VtkLabelReader<R> {
    fn header(&self) -> &VolumeHeader {
        &self.header.volume
    }

    fn read_plane(&mut self, z: usize, out: &mut [i32]) -> MeshResult<()> {
        if z != self.next_plane || z >= self.header.volume.dims[2] {
            return Err(MeshError::InvalidVolume(format!(
                "plane {z} requested, next readable plane is {}",
                self.next_plane
            )));
        }
        if out.len() != self.header.volume.plane_len() {
            return Err(MeshError::InvalidVolume(format!(
                "plane buffer holds {} labels, expected {}",
                out.len(),
                self.header.volume.plane_len()
            )));
        }
        match self.header.encoding {
            Encoding::Ascii => {
                for value in out.iter_mut() {
                    *value = self.next_ascii()?;
                }
            }
            Encoding::Binary => self.read_binary(out)?,
        }
        self.next_plane += 1;
        Ok(())
    }
}

/// Writes a label volume as a legacy VTK file with `int` scalars.
///
/// # Errors
///
/// [`MeshError::Io`] on write failure.
pub fn write_label_volume(path: impl AsRef<Path>, volume: &LabelVolume, encoding: Encoding) -> MeshResult<()> {
    let path = path.as_ref();
    let io = |e| MeshError::io(path, e);
    let file = File::create(path).map_err(io)?;
    let mut out = BufWriter::new(file);
    let header = volume.header();
    let [nx, ny, nz] = header.dims;
    let [dx, dy, dz] = header.spacing;
    let [ox, oy, oz] = header.origin;
    let mode = match encoding {
        Encoding::Ascii => "ASCII",
        Encoding::Binary => "BINARY",
    };
    write!(
        out,
        "# vtk DataFile Version 2.0\nlabel volume\n{mode}\nDATASET STRUCTURED_POINTS\n\
         DIMENSIONS {nx} {ny} {nz}\nORIGIN {ox} {oy} {oz}\nSPACING {dx} {dy} {dz}\n\
         POINT_DATA {}\nSCALARS GrainID int 1\nLOOKUP_TABLE default\n",
        header.voxel_count()
    )
    .map_err(io)?;
    match encoding {
        Encoding::Ascii => {
            for row in volume.labels().chunks(nx.max(1)) {
                let line: Vec<String> = row.iter().map(ToString::to_string).collect();
                writeln!(out, "{}", line.join(" ")).map_err(io)?;
            }
        }
        Encoding::Binary => {
            for label in volume.labels() {
                out.write_all(&label.to_be_bytes()).map_err(io)?;
            }
        }
    }
    out.flush().map_err(io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ASCII: &str = "# vtk DataFile Version 2.0\n\
        grains\n\
        ASCII\n\
        DATASET STRUCTURED_POINTS\n\
        DIMENSIONS 2 2 2\n\
        ORIGIN 1 2 3\n\
        SPACING 0.5 0.5 2\n\
        POINT_DATA 8\n\
        SCALARS GrainID int 1\n\
        LOOKUP_TABLE default\n\
        1 2\n3\n4 5 6 7\n   8\n";

    #[test]
    fn test_ascii_header_and_planes() {
        let mut reader = VtkLabelReader::from_reader(Cursor::new(ASCII), "mem.vtk").unwrap();
        let header = *reader.header();
        assert_eq!(header.dims, [2, 2, 2]);
        assert_eq!(header.origin, [1.0, 2.0, 3.0]);
        assert_eq!(header.spacing, [0.5, 0.5, 2.0]);

        let mut plane = [0; 4];
        reader.read_plane(0, &mut plane).unwrap();
        assert_eq!(plane, [1, 2, 3, 4]);
        reader.read_plane(1, &mut plane).unwrap();
        assert_eq!(plane, [5, 6, 7, 8]);
    }

    #[test]
    fn test_planes_must_be_read_in_order() {
        let mut reader = VtkLabelReader::from_reader(Cursor::new(ASCII), "mem.vtk").unwrap();
        let mut plane = [0; 4];
        assert!(matches!(reader.read_plane(1, &mut plane), Err(MeshError::InvalidVolume(_))));
    }

    #[test]
    fn test_binary_big_endian_shorts() {
        let mut data = b"# vtk DataFile Version 3.0\nt\nBINARY\nDATASET STRUCTURED_POINTS\n\
            DIMENSIONS 2 1 1\nSPACING 1 1 1\nPOINT_DATA 2\nSCALARS g short\nLOOKUP_TABLE default\n"
            .to_vec();
        data.extend_from_slice(&300i16.to_be_bytes());
        data.extend_from_slice(&(-2i16).to_be_bytes());
        let mut reader = VtkLabelReader::from_reader(Cursor::new(data), "mem.vtk").unwrap();
        assert_eq!(reader.vtk_header().scalar, ScalarType::Short);
        let mut plane = [0; 2];
        reader.read_plane(0, &mut plane).unwrap();
        assert_eq!(plane, [300, -2]);
    }

    #[test]
    fn test_truncated_data_is_parse_error() {
        let text = ASCII.replace("   8\n", "");
        let mut reader = VtkLabelReader::from_reader(Cursor::new(text), "mem.vtk").unwrap();
        let mut plane = [0; 4];
        reader.read_plane(0, &mut plane).unwrap();
        assert!(matches!(reader.read_plane(1, &mut plane), Err(MeshError::Parse(_))));
    }

    #[test]
    fn test_header_errors() {
        for (needle, replacement) in [
            ("SPACING 0.5 0.5 2\n", ""),
            ("DIMENSIONS 2 2 2\n", ""),
            ("POINT_DATA 8", "POINT_DATA 9"),
            ("STRUCTURED_POINTS", "RECTILINEAR_GRID"),
            ("ASCII\n", "HEX\n"),
            ("int 1", "float 1"),
        ] {
            let text = ASCII.replace(needle, replacement);
            let result = VtkLabelReader::from_reader(Cursor::new(text), "mem.vtk");
            assert!(matches!(result, Err(MeshError::Parse(_))), "{needle} -> {replacement}");
        }
    }
}
