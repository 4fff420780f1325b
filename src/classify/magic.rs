//! Magic-byte signatures
//!
//! Pure functions over a sample of the file: the first and last few KiB. Container
//! formats (ZIP, OLE compound files) are told apart by the part/stream names they carry,
//! which sit near the start (local headers) or the end (central directory) of the file.

use super::{ContentType, OfficeKind, SheetKind};

const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_SEARCH_WINDOW: usize = 1024;

const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const RTF_MAGIC: &[u8] = b"{\\rtf";

const ASF_MAGIC: &[u8] = &[
    0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE,
    0x6C,
];
const EBML_MAGIC: &[u8] = &[0x1A, 0x45, 0xDF, 0xA3];
const MPEG_PS_MAGIC: &[u8] = &[0x00, 0x00, 0x01, 0xBA];
const MPEG_VIDEO_MAGIC: &[u8] = &[0x00, 0x00, 0x01, 0xB3];
const TS_PACKET_LEN: usize = 188;
const TS_SYNC: u8 = 0x47;

const ODF_MIME_PREFIX: &[u8] = b"application/vnd.oasis.opendocument.";

/// ISO base media brands that hold still images rather than video
const IMAGE_BRANDS: &[&[u8; 4]] = &[b"heic", b"heix", b"heim", b"heis", b"mif1", b"msf1", b"avif", b"avis"];

/// ISO base media brands that hold audio only
const AUDIO_BRANDS: &[&[u8; 4]] = &[b"M4A ", b"M4B ", b"M4P ", b"F4A ", b"F4B "];

/// Delimiters recognised in delimited text
const DELIMITERS: &[u8] = b",;\t|";

/// Number of leading lines inspected for delimiter consistency
const DELIMITED_SAMPLE_LINES: usize = 5;

/// Classify a sample of file content.
///
/// `head` is the beginning of the file; `tail` the end of the file when it is larger
/// than the head sample, otherwise empty. `truncated` tells whether `head` stops short
/// of the end of the file.
pub fn sniff(head: &[u8], tail: &[u8], truncated: bool) -> ContentType {
    if head.is_empty() {
        return ContentType::Unknown;
    }

    if is_pdf(head) {
        return ContentType::Pdf;
    }

    if let Some(kind) = iso_media_kind(head) {
        return kind;
    }

    if is_image(head) {
        return ContentType::Image;
    }

    if is_video(head) {
        return ContentType::Video;
    }

    if head.starts_with(ZIP_MAGIC) {
        return zip_kind(head, tail);
    }

    if head.starts_with(CFB_MAGIC) {
        return compound_file_kind(head, tail);
    }

    if head.starts_with(RTF_MAGIC) {
        return ContentType::Office(OfficeKind::Word);
    }

    if looks_delimited(head, truncated) {
        return ContentType::Spreadsheet(SheetKind::Csv);
    }

    ContentType::Unknown
}

fn is_pdf(head: &[u8]) -> bool {
    let window = &head[..head.len().min(PDF_SEARCH_WINDOW)];
    contains(window, PDF_MAGIC)
}

fn is_image(head: &[u8]) -> bool {
    // JPEG
    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return true;
    }
    // PNG
    if head.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return true;
    }
    // GIF
    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return true;
    }
    // TIFF, both byte orders
    if head.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || head.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        return true;
    }
    // WebP
    if head.len() >= 12 && head.starts_with(b"RIFF") && &head[8..12] == b"WEBP" {
        return true;
    }
    // BMP: "BM" alone is too weak, require a known DIB header size
    if head.len() >= 18 && head.starts_with(b"BM") {
        let dib = u32::from_le_bytes([head[14], head[15], head[16], head[17]]);
        if matches!(dib, 12 | 40 | 52 | 56 | 64 | 108 | 124) {
            return true;
        }
    }
    // ICO: reserved 0, type 1, at least one entry
    if head.len() >= 6 && head.starts_with(&[0x00, 0x00, 0x01, 0x00]) && (head[4] != 0 || head[5] != 0) {
        return true;
    }
    false
}

/// ISO base media (`ftyp`) files carry either video, audio or still images
fn iso_media_kind(head: &[u8]) -> Option<ContentType> {
    if head.len() < 12 || &head[4..8] != b"ftyp" {
        return None;
    }

    let brand: &[u8] = &head[8..12];
    if IMAGE_BRANDS.iter().any(|b| b.as_slice() == brand) {
        return Some(ContentType::Image);
    }
    if AUDIO_BRANDS.iter().any(|b| b.as_slice() == brand) {
        return Some(ContentType::Unknown);
    }
    Some(ContentType::Video)
}

fn is_video(head: &[u8]) -> bool {
    if head.starts_with(EBML_MAGIC) || head.starts_with(ASF_MAGIC) {
        return true;
    }
    if head.starts_with(b"FLV") {
        return true;
    }
    if head.len() >= 12 && head.starts_with(b"RIFF") && &head[8..12] == b"AVI " {
        return true;
    }
    if head.starts_with(MPEG_PS_MAGIC) || head.starts_with(MPEG_VIDEO_MAGIC) {
        return true;
    }
    // MPEG transport stream: sync byte repeated at packet boundaries
    if head.len() > 2 * TS_PACKET_LEN
        && head[0] == TS_SYNC
        && head[TS_PACKET_LEN] == TS_SYNC
        && head[2 * TS_PACKET_LEN] == TS_SYNC
    {
        return true;
    }
    // Ogg only when it carries a Theora stream
    head.starts_with(b"OggS") && contains(head, b"theora")
}

fn zip_kind(head: &[u8], tail: &[u8]) -> ContentType {
    if let Some(pos) = find(head, ODF_MIME_PREFIX) {
        let rest = &head[pos + ODF_MIME_PREFIX.len()..];
        if rest.starts_with(b"text") {
            return ContentType::Office(OfficeKind::Word);
        }
        if rest.starts_with(b"spreadsheet") {
            return ContentType::Office(OfficeKind::Excel);
        }
        if rest.starts_with(b"presentation") {
            return ContentType::Office(OfficeKind::PowerPoint);
        }
        return ContentType::Unknown;
    }

    let has_part = |name: &[u8]| contains(head, name) || contains(tail, name);

    if has_part(b"word/") {
        ContentType::Office(OfficeKind::Word)
    } else if has_part(b"ppt/") {
        ContentType::Office(OfficeKind::PowerPoint)
    } else if has_part(b"xl/") {
        ContentType::Spreadsheet(SheetKind::Xlsx)
    } else {
        ContentType::Unknown
    }
}

fn compound_file_kind(head: &[u8], tail: &[u8]) -> ContentType {
    let has_stream = |name: &str| {
        let encoded = utf16le(name);
        contains(head, &encoded) || contains(tail, &encoded)
    };

    if has_stream("WordDocument") {
        ContentType::Office(OfficeKind::Word)
    } else if has_stream("PowerPoint Document") {
        ContentType::Office(OfficeKind::PowerPoint)
    } else if has_stream("Workbook") || has_stream("Book") {
        ContentType::Spreadsheet(SheetKind::Xls)
    } else {
        ContentType::Unknown
    }
}

/// Text whose leading lines agree on a field delimiter
fn looks_delimited(head: &[u8], truncated: bool) -> bool {
    if !looks_like_text(head) {
        return false;
    }

    let mut lines: Vec<&[u8]> = head
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect();

    // The last line of a truncated sample is probably cut short
    if truncated && lines.len() > 1 {
        lines.pop();
    }

    let sample: Vec<&[u8]> = lines
        .into_iter()
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .take(DELIMITED_SAMPLE_LINES)
        .collect();

    if sample.is_empty() {
        return false;
    }

    let quoted = sample.iter().any(|line| line.contains(&b'"'));

    DELIMITERS.iter().any(|&delimiter| {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| line.iter().filter(|&&b| b == delimiter).count())
            .collect();

        counts.iter().all(|&c| c > 0) && (quoted || counts.windows(2).all(|w| w[0] == w[1]))
    })
}

/// No NUL bytes, no stray control characters, and valid UTF-8 up to a cut-off
/// multibyte sequence at the very end
fn looks_like_text(head: &[u8]) -> bool {
    if head
        .iter()
        .any(|&b| b == 0 || (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C)))
    {
        return false;
    }

    match std::str::from_utf8(head) {
        Ok(_) => true,
        // incomplete sequence at the end of the sample
        Err(e) => e.error_len().is_none(),
    }
}

fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}
