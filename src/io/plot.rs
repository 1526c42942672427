//! Binary plot-file writer
//!
//! Fixed little-endian layout, one file per identification run:
//!
//! ```text
//! magic   u32  "VFMP" (0x504d4656)
//! version u32  1
//! n_nodes u32
//! n_elems u32
//! n_frames u32   (patched on finish)
//! n_vars  u32
//! -- dictionary, per variable --
//! kind    u8    0 = nodal vec3, 1 = element tensor, 2 = element sym tensor
//! len     u16   name byte count
//! name    [u8]
//! -- states, per frame --
//! time    f32
//! data    f32 payload per variable, dictionary order
//!         nodal vec3:        3 · n_nodes
//!         element tensor:    9 · n_elems (row major)
//!         element sym tensor 6 · n_elems (xx, yy, zz, xy, yz, xz)
//! ```
//!
//! Compatibility with this layout is bit-exact; changing it is a breaking
//! change of the artifact.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use nalgebra::{Matrix3, Vector3};

const MAGIC: u32 = 0x504d_4656; // "VFMP" little-endian
const VERSION: u32 = 1;

/// Storage class of one registered plot variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotVariableKind {
    /// One 3-vector per mesh node
    NodeVector = 0,
    /// One full 3×3 tensor per element
    ElementTensor = 1,
    /// One symmetric 3×3 tensor per element (6 stored components)
    ElementSymTensor = 2,
}

/// Per-frame payload for one variable, dictionary order
pub enum FrameData<'a> {
    NodeVector(&'a [Vector3<f64>]),
    ElementTensor(&'a [Matrix3<f64>]),
    ElementSymTensor(&'a [Matrix3<f64>]),
}

impl FrameData<'_> {
    fn kind(&self) -> PlotVariableKind {
        match self {
            FrameData::NodeVector(_) => PlotVariableKind::NodeVector,
            FrameData::ElementTensor(_) => PlotVariableKind::ElementTensor,
            FrameData::ElementSymTensor(_) => PlotVariableKind::ElementSymTensor,
        }
    }
}

/// Streaming plot-file writer
///
/// Register all variables first, then write frames; `finish` patches the
/// frame count into the header and flushes.
pub struct PlotFile {
    writer: BufWriter<File>,
    n_nodes: usize,
    n_elems: usize,
    kinds: Vec<PlotVariableKind>,
    n_frames: u32,
    dictionary_written: bool,
    names: Vec<String>,
}

impl PlotFile {
    /// Create the file and reserve the header
    pub fn create<P: AsRef<Path>>(path: P, n_nodes: usize, n_elems: usize) -> Result<Self, String> {
        let file = File::create(&path)
            .map_err(|e| format!("Unable to create plot file {}: {}", path.as_ref().display(), e))?;
        Ok(Self {
            writer: BufWriter::new(file),
            n_nodes,
            n_elems,
            kinds: Vec::new(),
            n_frames: 0,
            dictionary_written: false,
            names: Vec::new(),
        })
    }

    /// Register a variable; only legal before the first frame
    pub fn add_variable(&mut self, name: &str, kind: PlotVariableKind) -> Result<(), String> {
        if self.dictionary_written {
            return Err(format!(
                "Cannot register variable \"{}\" after the first frame.",
                name
            ));
        }
        if name.len() > u16::MAX as usize {
            return Err(format!("Variable name \"{}\" is too long.", name));
        }
        self.kinds.push(kind);
        self.names.push(name.to_string());
        Ok(())
    }

    fn put_u32(&mut self, v: u32) -> Result<(), String> {
        self.writer
            .write_all(&v.to_le_bytes())
            .map_err(|e| format!("Plot write failed: {}", e))
    }

    fn put_f32(&mut self, v: f32) -> Result<(), String> {
        self.writer
            .write_all(&v.to_le_bytes())
            .map_err(|e| format!("Plot write failed: {}", e))
    }

    fn write_dictionary(&mut self) -> Result<(), String> {
        self.put_u32(MAGIC)?;
        self.put_u32(VERSION)?;
        self.put_u32(self.n_nodes as u32)?;
        self.put_u32(self.n_elems as u32)?;
        self.put_u32(0)?; // frame count, patched in finish()
        self.put_u32(self.kinds.len() as u32)?;

        let entries: Vec<(PlotVariableKind, String)> = self
            .kinds
            .iter()
            .copied()
            .zip(self.names.iter().cloned())
            .collect();
        for (kind, name) in entries {
            self.writer
                .write_all(&[kind as u8])
                .map_err(|e| format!("Plot write failed: {}", e))?;
            self.writer
                .write_all(&(name.len() as u16).to_le_bytes())
                .map_err(|e| format!("Plot write failed: {}", e))?;
            self.writer
                .write_all(name.as_bytes())
                .map_err(|e| format!("Plot write failed: {}", e))?;
        }
        self.dictionary_written = true;
        Ok(())
    }

    /// Append one time frame; payloads must follow the dictionary exactly
    pub fn write_frame(&mut self, time: f64, data: &[FrameData]) -> Result<(), String> {
        if !self.dictionary_written {
            self.write_dictionary()?;
        }
        if data.len() != self.kinds.len() {
            return Err(format!(
                "Frame carries {} variables; the dictionary registered {}.",
                data.len(),
                self.kinds.len()
            ));
        }

        self.put_f32(time as f32)?;
        for (i, payload) in data.iter().enumerate() {
            if payload.kind() != self.kinds[i] {
                return Err(format!(
                    "Variable \"{}\" written with the wrong storage class.",
                    self.names[i]
                ));
            }
            match payload {
                FrameData::NodeVector(values) => {
                    if values.len() != self.n_nodes {
                        return Err(format!(
                            "Variable \"{}\": {} nodal values for {} nodes.",
                            self.names[i],
                            values.len(),
                            self.n_nodes
                        ));
                    }
                    for v in *values {
                        self.put_f32(v.x as f32)?;
                        self.put_f32(v.y as f32)?;
                        self.put_f32(v.z as f32)?;
                    }
                }
                FrameData::ElementTensor(values) => {
                    if values.len() != self.n_elems {
                        return Err(format!(
                            "Variable \"{}\": {} element values for {} elements.",
                            self.names[i],
                            values.len(),
                            self.n_elems
                        ));
                    }
                    for m in *values {
                        for r in 0..3 {
                            for c in 0..3 {
                                self.put_f32(m[(r, c)] as f32)?;
                            }
                        }
                    }
                }
                FrameData::ElementSymTensor(values) => {
                    if values.len() != self.n_elems {
                        return Err(format!(
                            "Variable \"{}\": {} element values for {} elements.",
                            self.names[i],
                            values.len(),
                            self.n_elems
                        ));
                    }
                    for m in *values {
                        self.put_f32(m[(0, 0)] as f32)?;
                        self.put_f32(m[(1, 1)] as f32)?;
                        self.put_f32(m[(2, 2)] as f32)?;
                        self.put_f32(m[(0, 1)] as f32)?;
                        self.put_f32(m[(1, 2)] as f32)?;
                        self.put_f32(m[(0, 2)] as f32)?;
                    }
                }
            }
        }
        self.n_frames += 1;
        Ok(())
    }

    /// Patch the frame count into the header and flush
    pub fn finish(mut self) -> Result<(), String> {
        if !self.dictionary_written {
            self.write_dictionary()?;
        }
        let frames = self.n_frames;
        self.writer
            .seek(SeekFrom::Start(16))
            .map_err(|e| format!("Plot write failed: {}", e))?;
        self.put_u32(frames)?;
        self.writer
            .flush()
            .map_err(|e| format!("Plot write failed: {}", e))
    }
}

/// Parsed payload of one variable in one frame
#[derive(Debug, Clone)]
pub enum PlotValues {
    NodeVector(Vec<Vector3<f64>>),
    ElementTensor(Vec<Matrix3<f64>>),
    ElementSymTensor(Vec<Matrix3<f64>>),
}

/// One parsed time frame
#[derive(Debug, Clone)]
pub struct PlotFrame {
    pub time: f64,
    pub data: Vec<PlotValues>,
}

/// A fully parsed plot file
#[derive(Debug, Clone)]
pub struct PlotDocument {
    pub n_nodes: usize,
    pub n_elems: usize,
    pub variables: Vec<(String, PlotVariableKind)>,
    pub frames: Vec<PlotFrame>,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], String> {
        if self.pos + n > self.bytes.len() {
            return Err("Plot file truncated.".to_string());
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, String> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u16(&mut self) -> Result<u16, String> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u8(&mut self) -> Result<u8, String> {
        Ok(self.take(1)?[0])
    }

    fn f32(&mut self) -> Result<f32, String> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }
}

/// Parse a plot file written by [`PlotFile`]
pub fn read_plot<P: AsRef<Path>>(path: P) -> Result<PlotDocument, String> {
    let bytes = std::fs::read(&path)
        .map_err(|e| format!("Unable to read plot file {}: {}", path.as_ref().display(), e))?;
    let mut cur = Cursor {
        bytes: &bytes,
        pos: 0,
    };

    if cur.u32()? != MAGIC {
        return Err("Not a plot file (bad magic).".to_string());
    }
    let version = cur.u32()?;
    if version != VERSION {
        return Err(format!("Unsupported plot version {}.", version));
    }
    let n_nodes = cur.u32()? as usize;
    let n_elems = cur.u32()? as usize;
    let n_frames = cur.u32()? as usize;
    let n_vars = cur.u32()? as usize;

    let mut variables = Vec::with_capacity(n_vars);
    for _ in 0..n_vars {
        let kind = match cur.u8()? {
            0 => PlotVariableKind::NodeVector,
            1 => PlotVariableKind::ElementTensor,
            2 => PlotVariableKind::ElementSymTensor,
            other => return Err(format!("Unknown plot variable kind {}.", other)),
        };
        let len = cur.u16()? as usize;
        let name = String::from_utf8(cur.take(len)?.to_vec())
            .map_err(|_| "Plot variable name is not valid UTF-8.".to_string())?;
        variables.push((name, kind));
    }

    let mut frames = Vec::with_capacity(n_frames);
    for _ in 0..n_frames {
        let time = cur.f32()? as f64;
        let mut data = Vec::with_capacity(n_vars);
        for (_, kind) in &variables {
            let values = match kind {
                PlotVariableKind::NodeVector => {
                    let mut vs = Vec::with_capacity(n_nodes);
                    for _ in 0..n_nodes {
                        let (x, y, z) = (cur.f32()?, cur.f32()?, cur.f32()?);
                        vs.push(Vector3::new(x as f64, y as f64, z as f64));
                    }
                    PlotValues::NodeVector(vs)
                }
                PlotVariableKind::ElementTensor => {
                    let mut ms = Vec::with_capacity(n_elems);
                    for _ in 0..n_elems {
                        let mut m = Matrix3::zeros();
                        for r in 0..3 {
                            for c in 0..3 {
                                m[(r, c)] = cur.f32()? as f64;
                            }
                        }
                        ms.push(m);
                    }
                    PlotValues::ElementTensor(ms)
                }
                PlotVariableKind::ElementSymTensor => {
                    let mut ms = Vec::with_capacity(n_elems);
                    for _ in 0..n_elems {
                        let (xx, yy, zz) = (cur.f32()?, cur.f32()?, cur.f32()?);
                        let (xy, yz, xz) = (cur.f32()?, cur.f32()?, cur.f32()?);
                        let m = Matrix3::new(
                            xx as f64, xy as f64, xz as f64,
                            xy as f64, yy as f64, yz as f64,
                            xz as f64, yz as f64, zz as f64,
                        );
                        ms.push(m);
                    }
                    PlotValues::ElementSymTensor(ms)
                }
            };
            data.push(values);
        }
        frames.push(PlotFrame { time, data });
    }

    Ok(PlotDocument {
        n_nodes,
        n_elems,
        variables,
        frames,
    })
}
