//! Encoding block text with a named character encoding.
//!
//! `size_bytes` and `hash_sha256` of a block describe its text as encoded by
//! the producer, so the checker must reproduce that byte sequence exactly.
//! Unicode transformation formats, ASCII and true ISO-8859-1 are handled
//! here; every other label is resolved through `encoding_rs`.

use std::borrow::Cow;

use thiserror::Error;

/// Why text could not be encoded with the requested encoding.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EncodeFailure {
    #[error("unknown encoding: {0:?}")]
    UnknownEncoding(String),

    #[error("character {ch:?} at position {position} cannot be encoded as {encoding}")]
    Unmappable {
        encoding: String,
        ch: char,
        position: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

#[derive(Clone, Copy, Debug)]
enum Codec {
    Utf8,
    /// UTF-8 preceded by the `EF BB BF` signature.
    Utf8Sig,
    Ascii,
    Latin1,
    Utf16 { endian: Endian, bom: bool },
    Utf32 { endian: Endian, bom: bool },
    Whatwg(&'static encoding_rs::Encoding),
}

/// Encode `text` with the encoding named by `label`.
///
/// Labels are matched case-insensitively and `_` is treated as `-`, so
/// `"UTF_8"`, `"utf8"` and `"utf-8"` are the same encoding.
pub fn encode<'a>(text: &'a str, label: &str) -> Result<Cow<'a, [u8]>, EncodeFailure> {
    let codec = resolve(label).ok_or_else(|| EncodeFailure::UnknownEncoding(label.to_string()))?;
    match codec {
        Codec::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
        Codec::Utf8Sig => {
            let mut out = Vec::with_capacity(text.len() + 3);
            out.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
            out.extend_from_slice(text.as_bytes());
            Ok(Cow::Owned(out))
        }
        Codec::Ascii => encode_single_byte(text, label, 0x7F),
        Codec::Latin1 => encode_single_byte(text, label, 0xFF),
        Codec::Utf16 { endian, bom } => {
            let mut out = Vec::with_capacity(text.len() * 2 + 2);
            if bom {
                push_u16(&mut out, 0xFEFF, endian);
            }
            for unit in text.encode_utf16() {
                push_u16(&mut out, unit, endian);
            }
            Ok(Cow::Owned(out))
        }
        Codec::Utf32 { endian, bom } => {
            let mut out = Vec::with_capacity(text.len() * 4 + 4);
            if bom {
                push_u32(&mut out, 0xFEFF, endian);
            }
            for ch in text.chars() {
                push_u32(&mut out, ch as u32, endian);
            }
            Ok(Cow::Owned(out))
        }
        Codec::Whatwg(encoding) => {
            let (bytes, _, had_unmappable) = encoding.encode(text);
            if had_unmappable {
                return Err(first_unmappable(text, encoding));
            }
            Ok(Cow::Owned(bytes.into_owned()))
        }
    }
}

fn resolve(label: &str) -> Option<Codec> {
    let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
    let codec = match normalized.as_str() {
        "utf-8" | "utf8" | "u8" | "utf" | "cp65001" => Codec::Utf8,
        "utf-8-sig" | "utf8-sig" => Codec::Utf8Sig,
        "ascii" | "us-ascii" | "646" | "us" => Codec::Ascii,
        "latin-1" | "latin1" | "l1" | "iso-8859-1" | "iso8859-1" | "8859" | "cp819" | "iso-ir-100" => {
            Codec::Latin1
        }
        "utf-16" | "utf16" => Codec::Utf16 {
            endian: Endian::Little,
            bom: true,
        },
        "utf-16le" | "utf-16-le" => Codec::Utf16 {
            endian: Endian::Little,
            bom: false,
        },
        "utf-16be" | "utf-16-be" => Codec::Utf16 {
            endian: Endian::Big,
            bom: false,
        },
        "utf-32" | "utf32" => Codec::Utf32 {
            endian: Endian::Little,
            bom: true,
        },
        "utf-32le" | "utf-32-le" => Codec::Utf32 {
            endian: Endian::Little,
            bom: false,
        },
        "utf-32be" | "utf-32-be" => Codec::Utf32 {
            endian: Endian::Big,
            bom: false,
        },
        other => {
            let encoding = encoding_rs::Encoding::for_label(other.as_bytes())?;
            // Labels whose encoder writes something else (the replacement
            // encoding, UTF-16 variants) cannot reproduce the producer's bytes.
            if encoding.output_encoding() != encoding {
                return None;
            }
            Codec::Whatwg(encoding)
        }
    };
    Some(codec)
}

fn encode_single_byte<'a>(text: &'a str, label: &str, max: u32) -> Result<Cow<'a, [u8]>, EncodeFailure> {
    if text.is_ascii() {
        return Ok(Cow::Borrowed(text.as_bytes()));
    }
    let mut out = Vec::with_capacity(text.len());
    for (position, ch) in text.chars().enumerate() {
        let code = ch as u32;
        if code > max {
            return Err(EncodeFailure::Unmappable {
                encoding: label.to_string(),
                ch,
                position,
            });
        }
        out.push(code as u8);
    }
    Ok(Cow::Owned(out))
}

fn first_unmappable(text: &str, encoding: &'static encoding_rs::Encoding) -> EncodeFailure {
    let mut buf = [0u8; 4];
    let found = text.chars().enumerate().find(|(_, ch)| {
        let (_, _, unmappable) = encoding.encode(ch.encode_utf8(&mut buf));
        unmappable
    });
    match found {
        Some((position, ch)) => EncodeFailure::Unmappable {
            encoding: encoding.name().to_string(),
            ch,
            position,
        },
        None => EncodeFailure::UnknownEncoding(encoding.name().to_string()),
    }
}

fn push_u16(out: &mut Vec<u8>, unit: u16, endian: Endian) {
    match endian {
        Endian::Little => out.extend_from_slice(&unit.to_le_bytes()),
        Endian::Big => out.extend_from_slice(&unit.to_be_bytes()),
    }
}

fn push_u32(out: &mut Vec<u8>, unit: u32, endian: Endian) {
    match endian {
        Endian::Little => out.extend_from_slice(&unit.to_le_bytes()),
        Endian::Big => out.extend_from_slice(&unit.to_be_bytes()),
    }
}
