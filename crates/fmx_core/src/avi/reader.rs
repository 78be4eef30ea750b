//! Header walker for RIFF/AVI files.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::models::AviStreamInfo;

// Four-character codes, packed little-endian.
const RIFF: u32 = 0x4646_4952; // "RIFF"
const AVI_: u32 = 0x2049_5641; // "AVI "
const LIST: u32 = 0x5453_494C; // "LIST"
const HDRL: u32 = 0x6C72_6468; // "hdrl"
const AVIH: u32 = 0x6869_7661; // "avih"
const STRL: u32 = 0x6C72_7473; // "strl"
const STRH: u32 = 0x6872_7473; // "strh"
const VIDS: u32 = 0x7364_6976; // "vids"
const AUDS: u32 = 0x7364_7561; // "auds"

/// Size of the main header record including its chunk tag and size.
const MAIN_HEADER_LEN: usize = 64;
/// Size of a stream header record including its chunk tag and size.
const STREAM_HEADER_LEN: usize = 64;
/// Byte offset of `dwTotalFrames` inside the main header record.
const TOTAL_FRAMES_OFFSET: usize = 24;
/// Byte offset of `fccType` inside the stream header record.
const STREAM_TYPE_OFFSET: usize = 8;

impl AviStreamInfo {
    /// Read the stream layout of the AVI file at `path`.
    ///
    /// Files that cannot be opened are reported as invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => parse_avi(&mut BufReader::new(file)),
            Err(e) => {
                tracing::debug!("Cannot open '{}': {}", path.display(), e);
                Self::invalid()
            }
        }
    }
}

/// Header of a `LIST` chunk.
struct ListHeader {
    offset: u64,
    size: u32,
    list_type: u32,
}

/// Parse the container headers from any seekable byte source.
///
/// Never fails: a stream that does not start with `RIFF`/`AVI `/`hdrl`/`avih`
/// yields an invalid result with an unknown frame count. Once the main
/// header is read, the `LIST` chunks after it are walked in order, whether
/// nested in `hdrl` or not. Only `strl` lists are counted; others are skipped
/// by size. The walk ends at a chunk that is not a `LIST`, a `strl` without a
/// `strh` record, or the end of the data.
pub fn parse_avi<R: Read + Seek>(reader: &mut R) -> AviStreamInfo {
    let frame_count = match read_main_header(reader) {
        Ok(Some(frames)) => frames,
        Ok(None) => return AviStreamInfo::invalid(),
        Err(e) => {
            tracing::debug!("AVI header read failed: {}", e);
            return AviStreamInfo::invalid();
        }
    };

    let mut info = AviStreamInfo {
        is_valid: false,
        video_stream_count: 0,
        audio_stream_count: 0,
        frame_count: i64::from(frame_count),
    };

    let mut parsed_streams = 0u32;
    loop {
        let list = match read_list_header(reader) {
            Ok(Some(list)) => list,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("AVI stream list read stopped: {}", e);
                break;
            }
        };

        if list.list_type == STRL {
            match read_stream_type(reader) {
                Ok(Some(stream_type)) => {
                    parsed_streams += 1;
                    match stream_type {
                        VIDS => info.video_stream_count += 1,
                        AUDS => info.audio_stream_count += 1,
                        _ => {}
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("AVI stream header read stopped: {}", e);
                    break;
                }
            }
        }

        // Advance by the declared size whatever the list contained.
        let next = list.offset + u64::from(list.size) + 8;
        if reader.seek(SeekFrom::Start(next)).is_err() {
            break;
        }
    }

    info.is_valid = parsed_streams > 0;
    info
}

/// Check the RIFF preamble and return the declared total frames, or `None`
/// on a structural mismatch.
fn read_main_header<R: Read + Seek>(reader: &mut R) -> io::Result<Option<u32>> {
    if read_u32_le(reader)? != RIFF {
        return Ok(None);
    }
    reader.seek(SeekFrom::Current(4))?;
    if read_u32_le(reader)? != AVI_ {
        return Ok(None);
    }

    match read_list_header(reader)? {
        Some(list) if list.list_type == HDRL => {}
        _ => return Ok(None),
    }

    let mut record = [0u8; MAIN_HEADER_LEN];
    reader.read_exact(&mut record)?;
    if u32_at(&record, 0) != AVIH {
        return Ok(None);
    }

    Ok(Some(u32_at(&record, TOTAL_FRAMES_OFFSET)))
}

fn read_list_header<R: Read + Seek>(reader: &mut R) -> io::Result<Option<ListHeader>> {
    let offset = reader.stream_position()?;
    if read_u32_le(reader)? != LIST {
        return Ok(None);
    }
    let size = read_u32_le(reader)?;
    let list_type = read_u32_le(reader)?;

    Ok(Some(ListHeader {
        offset,
        size,
        list_type,
    }))
}

/// Read a `strh` record and return its stream type code.
fn read_stream_type<R: Read>(reader: &mut R) -> io::Result<Option<u32>> {
    let mut record = [0u8; STREAM_HEADER_LEN];
    reader.read_exact(&mut record)?;
    if u32_at(&record, 0) != STRH {
        return Ok(None);
    }
    Ok(Some(u32_at(&record, STREAM_TYPE_OFFSET)))
}

fn read_u32_le<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(buf)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    use super::test_support::{avih_record, build_avi, list_chunk, riff_avi, strl_list};

    #[test]
    fn rejects_non_riff_data() {
        let info = parse_avi(&mut Cursor::new(b"JUNKJUNKJUNKJUNK".to_vec()));
        assert!(!info.is_valid);
        assert_eq!(info.frame_count, -1);
    }

    #[test]
    fn rejects_wrong_form_type() {
        let mut data = build_avi(10, &[VIDS]);
        data[8..12].copy_from_slice(b"WAVE");
        let info = parse_avi(&mut Cursor::new(data));
        assert!(!info.is_valid);
        assert_eq!(info.frame_count, -1);
    }

    #[test]
    fn rejects_truncated_header() {
        let data = build_avi(10, &[VIDS]);
        let info = parse_avi(&mut Cursor::new(data[..20].to_vec()));
        assert!(!info.is_valid);
        assert_eq!(info.frame_count, -1);
    }

    #[test]
    fn counts_video_and_audio_streams() {
        let data = build_avi(240, &[VIDS, AUDS, VIDS]);
        let info = parse_avi(&mut Cursor::new(data));
        assert!(info.is_valid);
        assert_eq!(info.frame_count, 240);
        assert_eq!(info.video_stream_count, 2);
        assert_eq!(info.audio_stream_count, 1);
        assert!(info.has_audio());
    }

    #[test]
    fn header_without_streams_is_invalid() {
        let data = build_avi(50, &[]);
        let info = parse_avi(&mut Cursor::new(data));
        assert!(!info.is_valid);
        assert_eq!(info.frame_count, 50);
        assert_eq!(info.video_stream_count, 0);
    }

    #[test]
    fn unknown_stream_types_still_count_as_parsed() {
        let txts = 0x7374_7874;
        let info = parse_avi(&mut Cursor::new(build_avi(5, &[txts])));
        assert!(info.is_valid);
        assert_eq!(info.video_stream_count, 0);
        assert_eq!(info.audio_stream_count, 0);
    }

    #[test]
    fn skips_unknown_lists_between_streams() {
        let mut odml = b"dmlh".to_vec();
        odml.extend_from_slice(&248u32.to_le_bytes());
        odml.extend_from_slice(&[0u8; 248]);

        let mut hdrl = avih_record(90);
        hdrl.extend_from_slice(&strl_list(VIDS));
        hdrl.extend_from_slice(&list_chunk(b"odml", &odml));
        hdrl.extend_from_slice(&strl_list(AUDS));

        let mut body = list_chunk(b"hdrl", &hdrl);
        body.extend_from_slice(&list_chunk(b"INFO", b"ISFT\x04\0\0\0enc\0"));
        body.extend_from_slice(&list_chunk(b"movi", b"00dc\0\0\0\0"));

        let info = parse_avi(&mut Cursor::new(riff_avi(&body)));
        assert!(info.is_valid);
        assert_eq!(info.frame_count, 90);
        assert_eq!(info.video_stream_count, 1);
        assert_eq!(info.audio_stream_count, 1);
    }

    #[test]
    fn stops_at_non_list_chunk() {
        let mut data = build_avi(12, &[VIDS]);
        // A JUNK chunk ends the walk; the stream after it is not seen.
        data.extend_from_slice(b"JUNK");
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 4]);
        let tail = build_avi(0, &[AUDS]);
        data.extend_from_slice(&tail[12 + 12 + MAIN_HEADER_LEN..]);

        let info = parse_avi(&mut Cursor::new(data));
        assert!(info.is_valid);
        assert_eq!(info.video_stream_count, 1);
        assert_eq!(info.audio_stream_count, 0);
    }

    #[test]
    fn strl_without_strh_ends_walk() {
        let mut data = build_avi(12, &[VIDS, AUDS]);
        // Corrupt the second strh tag.
        let first_strl = 12 + 12 + MAIN_HEADER_LEN;
        let strl_len = 12 + STREAM_HEADER_LEN + 24;
        let second_strh = first_strl + strl_len + 12;
        data[second_strh..second_strh + 4].copy_from_slice(b"xxxx");

        let info = parse_avi(&mut Cursor::new(data));
        assert!(info.is_valid);
        assert_eq!(info.video_stream_count, 1);
        assert_eq!(info.audio_stream_count, 0);
    }

    #[test]
    fn from_path_reads_file_and_handles_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.avi");
        std::fs::write(&path, build_avi(300, &[VIDS, AUDS])).unwrap();

        let info = AviStreamInfo::from_path(&path);
        assert!(info.is_valid);
        assert_eq!(info.frame_count, 300);

        let missing = AviStreamInfo::from_path(dir.path().join("missing.avi"));
        assert!(!missing.is_valid);
        assert_eq!(missing.frame_count, -1);
    }
}
