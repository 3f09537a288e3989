//! Loading and saving models and blendshape sets.
//!
//! Callers go through the [`ModelStore`] trait; [`FileStore`] is the
//! file-system implementation. Native archives are bincode streams:
//!
//! ```text
//! [u8; 4] tag      "MFMM" for a morphable model, "MFBS" for blendshapes
//! u32 version      MODEL_FORMAT_VERSION
//! payload          the serde encoding of the model or blendshape list
//! ```
//!
//! Legacy `.scm` files are read by [`crate::scm`]. Any file name may carry an
//! extra `.bz2` suffix, in which case the stream is bzip2-compressed.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::expression::{validate_blendshapes, Blendshape};
use crate::model::MorphableModel;
use crate::scm::load_scm_model_from_reader;

/// Version written into, and required from, every native archive.
pub const MODEL_FORMAT_VERSION: u32 = 1;

const MODEL_TAG: [u8; 4] = *b"MFMM";
const BLENDSHAPES_TAG: [u8; 4] = *b"MFBS";

/// Source of models and blendshape sets.
pub trait ModelStore {
    /// Load a model stored in the native archive format.
    fn load_model(&self, path: &Path) -> Result<MorphableModel>;

    /// Load a model stored in the legacy `.scm` format.
    fn load_legacy_model(&self, path: &Path) -> Result<MorphableModel>;

    /// Load a blendshape set stored in the native archive format.
    fn load_blendshapes(&self, path: &Path) -> Result<Vec<Blendshape>>;
}

/// On-disk model formats, selected by file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// `.bin`
    Native,
    /// `.scm`
    Legacy,
}

impl ModelFormat {
    /// Pick the format from the file name. A trailing `.bz2` is ignored.
    /// Any other suffix is an [`Error::UnsupportedExtension`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let name = name.strip_suffix(".bz2").unwrap_or(&name);

        if name.ends_with(".bin") {
            Ok(ModelFormat::Native)
        } else if name.ends_with(".scm") {
            Ok(ModelFormat::Legacy)
        } else {
            Err(Error::UnsupportedExtension(path.to_path_buf()))
        }
    }
}

/// Load a model from `store`, choosing the loader by the file name suffix.
pub fn load_morphable_model<S: ModelStore + ?Sized>(store: &S, path: &Path) -> Result<MorphableModel> {
    match ModelFormat::from_path(path)? {
        ModelFormat::Native => store.load_model(path),
        ModelFormat::Legacy => store.load_legacy_model(path),
    }
}

/// Models and blendshapes stored as files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    /// Save a model as a native archive.
    pub fn save_model(&self, path: &Path, model: &MorphableModel) -> Result<()> {
        write_archive(path, MODEL_TAG, model)
    }

    /// Save a blendshape set as a native archive.
    pub fn save_blendshapes(&self, path: &Path, blendshapes: &[Blendshape]) -> Result<()> {
        write_archive(path, BLENDSHAPES_TAG, blendshapes)
    }
}

impl ModelStore for FileStore {
    fn load_model(&self, path: &Path) -> Result<MorphableModel> {
        let model: MorphableModel = read_archive(open_reader(path)?, MODEL_TAG, "morphable model")?;
        model.validate()?;
        debug!(
            "Loaded model {:?}: {} vertices, {} shape / {} color / {} expression components",
            path,
            model.num_vertices(),
            model.num_shape_components(),
            model.num_color_components(),
            model.num_expression_components()
        );
        Ok(model)
    }

    fn load_legacy_model(&self, path: &Path) -> Result<MorphableModel> {
        load_scm_model_from_reader(open_reader(path)?)
    }

    fn load_blendshapes(&self, path: &Path) -> Result<Vec<Blendshape>> {
        let blendshapes: Vec<Blendshape> =
            read_archive(open_reader(path)?, BLENDSHAPES_TAG, "blendshape set")?;
        validate_blendshapes(&blendshapes)?;
        debug!("Loaded {} blendshapes from {:?}", blendshapes.len(), path);
        Ok(blendshapes)
    }
}

#[derive(Serialize, Deserialize)]
struct ArchiveHeader {
    tag: [u8; 4],
    version: u32,
}

fn is_bz2(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("bz2"))
}

fn open_reader(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    if is_bz2(path) {
        Ok(Box::new(BzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

fn read_archive<T: DeserializeOwned, R: Read>(
    mut reader: R,
    tag: [u8; 4],
    expected: &'static str,
) -> Result<T> {
    // Decoding from a slice bounds every length by the bytes present.
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let header: ArchiveHeader = bincode::deserialize(&bytes)?;
    if header.tag != tag {
        return Err(Error::WrongArchive {
            expected,
            found: header.tag,
        });
    }
    if header.version != MODEL_FORMAT_VERSION {
        return Err(Error::UnsupportedVersion {
            found: header.version,
            expected: MODEL_FORMAT_VERSION,
        });
    }
    let header_len = bincode::serialized_size(&header)? as usize;
    Ok(bincode::deserialize(&bytes[header_len..])?)
}

fn write_payload<T: Serialize + ?Sized, W: Write>(writer: &mut W, tag: [u8; 4], payload: &T) -> Result<()> {
    let header = ArchiveHeader {
        tag,
        version: MODEL_FORMAT_VERSION,
    };
    bincode::serialize_into(&mut *writer, &header)?;
    bincode::serialize_into(&mut *writer, payload)?;
    Ok(())
}

fn write_archive<T: Serialize + ?Sized>(path: &Path, tag: [u8; 4], payload: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    if is_bz2(path) {
        let mut encoder = BzEncoder::new(writer, Compression::default());
        write_payload(&mut encoder, tag, payload)?;
        encoder.finish()?.flush()?;
    } else {
        write_payload(&mut writer, tag, payload)?;
        writer.flush()?;
    }
    Ok(())
}
