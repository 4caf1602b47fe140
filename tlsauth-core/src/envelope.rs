//! Envelope encodings.
//!
//! A token is the envelope serialized as compact, ASCII-only JSON,
//! `{"data":…,"expire_after":…,"time":…,"sign":…}` where `sign` is the standard base64 of the
//! raw signature, then zlib compressed, then base64 encoded with the URL-safe
//! [`TOKEN`](crate::base64::TOKEN) alphabet. Decoding reverses each stage and reports the
//! stage that failed.

use core::fmt;
use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use serde::{Deserialize, Serialize};

use crate::CodecError;
use crate::base64::{self, STANDARD, TOKEN};
use crate::canonical::{canonicalize, to_json};

/// Decoded envelopes larger than this are rejected.
pub const MAX_ENVELOPE_LEN: usize = 16 << 20;

/// The fields of a token, before encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub data: String,
    pub expire_after: u64,
    pub issued_at: i64,
    pub signature: Vec<u8>,
}

#[derive(Serialize)]
struct WireEnvelope<'a> {
    data: &'a str,
    expire_after: u64,
    time: i64,
    sign: &'a str,
}

#[derive(Deserialize)]
struct RawEnvelope {
    data: Option<String>,
    expire_after: Option<u64>,
    time: Option<i64>,
    sign: Option<String>,
}

impl Envelope {
    /// The bytes covered by [`Envelope::signature`].
    pub fn canonical(&self) -> Vec<u8> {
        canonicalize(&self.data, self.expire_after, self.issued_at)
    }

    pub fn encode(&self) -> Result<Token, CodecError> {
        let sign =
            base64::encode(&STANDARD, &self.signature).map_err(|_| CodecError::EncodeFailure)?;
        let wire = WireEnvelope {
            data: &self.data,
            expire_after: self.expire_after,
            time: self.issued_at,
            sign: &sign,
        };

        let json = to_json(&wire).map_err(CodecError::SerializeFailure)?;
        let compressed = compress(&json).map_err(CodecError::CompressFailure)?;
        let token = base64::encode(&TOKEN, &compressed).map_err(|_| CodecError::EncodeFailure)?;

        Ok(Token(token))
    }
}

/// An envelope read from a token whose signature has **not** been checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UntrustedEnvelope {
    pub data: String,
    pub expire_after: u64,
    pub issued_at: i64,
    sign: Option<String>,
}

impl UntrustedEnvelope {
    /// The bytes the signature should cover, rebuilt from the parsed fields.
    pub fn canonical(&self) -> Vec<u8> {
        canonicalize(&self.data, self.expire_after, self.issued_at)
    }

    /// The raw signature bytes.
    ///
    /// Fails with [`CodecError::MissingField`] if the envelope has no `sign` field.
    pub fn signature(&self) -> Result<Vec<u8>, CodecError> {
        let sign = self
            .sign
            .as_deref()
            .ok_or(CodecError::MissingField("sign"))?;
        base64::decode_vec(&STANDARD, sign.as_bytes())
    }
}

/// Decode a token back into its envelope without verifying it.
pub fn decode(token: &str) -> Result<UntrustedEnvelope, CodecError> {
    if token.is_empty() {
        return Err(CodecError::DecodeFailure);
    }

    let compressed = base64::decode_vec(&TOKEN, token.as_bytes())?;
    let json = decompress(&compressed).map_err(CodecError::DecompressFailure)?;

    // only objects are envelopes, serde would also accept a positional array
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&json).map_err(CodecError::ParseFailure)?;
    let raw = RawEnvelope::deserialize(serde_json::Value::Object(object))
        .map_err(CodecError::ParseFailure)?;

    Ok(UntrustedEnvelope {
        data: raw.data.ok_or(CodecError::MissingField("data"))?,
        expire_after: raw
            .expire_after
            .ok_or(CodecError::MissingField("expire_after"))?,
        issued_at: raw.time.ok_or(CodecError::MissingField("time"))?,
        sign: raw.sign,
    })
}

fn compress(json: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(json.len() / 2), Compression::default());
    encoder.write_all(json)?;
    encoder.finish()
}

fn decompress(compressed: &[u8]) -> io::Result<Vec<u8>> {
    let mut inflater = Decompress::new(true);
    let mut json = Vec::with_capacity(compressed.len().saturating_mul(4).min(MAX_ENVELOPE_LEN));

    loop {
        // one byte of headroom past the limit so oversized envelopes are detected
        if json.len() == json.capacity() {
            let additional = json.capacity().max(64).min(MAX_ENVELOPE_LEN + 1 - json.len());
            json.reserve_exact(additional);
        }

        let (before_in, before_out) = (inflater.total_in(), inflater.total_out());
        let status = inflater.decompress_vec(
            &compressed[before_in as usize..],
            &mut json,
            FlushDecompress::None,
        )?;

        if json.len() > MAX_ENVELOPE_LEN {
            return Err(invalid("envelope is too large"));
        }
        if status == Status::StreamEnd {
            break;
        }
        // output space was available, so no progress means the input ran out
        if inflater.total_in() == before_in && inflater.total_out() == before_out {
            return Err(invalid("compressed envelope is truncated"));
        }
    }

    if inflater.total_in() as usize != compressed.len() {
        return Err(invalid("trailing bytes after compressed envelope"));
    }

    Ok(json)
}

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// A compressed, URL-safe encoded envelope.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode the envelope without verifying it.
    pub fn inspect(&self) -> Result<UntrustedEnvelope, CodecError> {
        decode(&self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Token> for String {
    fn from(value: Token) -> Self {
        value.0
    }
}

impl TryFrom<String> for Token {
    type Error = CodecError;

    /// Only checks the shape of the token. Nothing is decoded.
    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() || value.len() % 4 != 0 || !value.bytes().all(|b| TOKEN.contains(b)) {
            return Err(CodecError::DecodeFailure);
        }
        Ok(Token(value))
    }
}

impl std::str::FromStr for Token {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::try_from(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(data: &str) -> Envelope {
        Envelope {
            data: data.to_owned(),
            expire_after: 60,
            issued_at: 1_700_000_000,
            signature: vec![0xfb, 0xff, 0x00, 0x10, 0x20],
        }
    }

    /// Build a token from arbitrary JSON text.
    fn token_from_json(json: &str) -> String {
        let compressed = compress(json.as_bytes()).unwrap();
        base64::encode(&TOKEN, &compressed).unwrap()
    }

    #[test]
    fn encode_decode() {
        let env = envelope("hello");
        let token = env.encode().unwrap();
        assert!(token.as_str().bytes().all(|b| TOKEN.contains(b)));

        let decoded = decode(token.as_str()).unwrap();
        assert_eq!(decoded.data, "hello");
        assert_eq!(decoded.expire_after, 60);
        assert_eq!(decoded.issued_at, 1_700_000_000);
        assert_eq!(decoded.signature().unwrap(), env.signature);
        assert_eq!(decoded.canonical(), env.canonical());
    }

    #[test]
    fn wire_layout() {
        let token = envelope("hi").encode().unwrap();
        let compressed = base64::decode_vec(&TOKEN, token.as_str().as_bytes()).unwrap();
        let json = decompress(&compressed).unwrap();
        assert_eq!(
            std::str::from_utf8(&json).unwrap(),
            r#"{"data":"hi","expire_after":60,"time":1700000000,"sign":"+\/8AECA="}"#
        );
    }

    #[test]
    fn wire_json_is_ascii() {
        let token = envelope("a/b é 🚀").encode().unwrap();
        let compressed = base64::decode_vec(&TOKEN, token.as_str().as_bytes()).unwrap();
        let json = decompress(&compressed).unwrap();
        assert!(json.is_ascii());
        assert!(
            std::str::from_utf8(&json)
                .unwrap()
                .starts_with(r#"{"data":"a\/b \u00e9 \ud83d\ude80","expire_after":60,"#)
        );
        assert_eq!(decode(token.as_str()).unwrap().data, "a/b é 🚀");
    }

    #[test]
    fn large_envelopes() {
        // spans many deflate windows and does not compress well
        let data: String = (0..200_000u32)
            .map(|i| char::from(b'a' + (i.wrapping_mul(2_654_435_761) >> 27) as u8 % 26))
            .collect();
        let env = envelope(&data);
        let decoded = decode(env.encode().unwrap().as_str()).unwrap();
        assert_eq!(decoded.data, data);
        assert_eq!(decoded.signature().unwrap(), env.signature);

        let long = "x".repeat(64 * 1024);
        assert_eq!(decode(envelope(&long).encode().unwrap().as_str()).unwrap().data, long);
    }

    #[test]
    fn limit_is_inclusive() {
        for len in [MAX_ENVELOPE_LEN - 1, MAX_ENVELOPE_LEN] {
            let json = vec![b' '; len];
            assert_eq!(decompress(&compress(&json).unwrap()).unwrap().len(), len);
        }
    }

    #[test]
    fn empty_token() {
        assert!(matches!(decode(""), Err(CodecError::DecodeFailure)));
    }

    #[test]
    fn bad_base64() {
        assert!(matches!(decode("abc"), Err(CodecError::DecodeFailure)));
        assert!(matches!(decode("ab+/"), Err(CodecError::DecodeFailure)));
        assert!(matches!(decode("ab=="), Err(CodecError::DecodeFailure)));
    }

    #[test]
    fn not_compressed() {
        let token = base64::encode(&TOKEN, b"{\"data\":\"x\"}").unwrap();
        assert!(matches!(decode(&token), Err(CodecError::DecompressFailure(_))));
    }

    #[test]
    fn truncated_stream() {
        let compressed = compress(br#"{"data":"x","expire_after":0,"time":1,"sign":""}"#).unwrap();
        let token = base64::encode(&TOKEN, &compressed[..compressed.len() - 3]).unwrap();
        assert!(matches!(decode(&token), Err(CodecError::DecompressFailure(_))));
    }

    #[test]
    fn trailing_bytes() {
        let mut compressed =
            compress(br#"{"data":"x","expire_after":0,"time":1,"sign":""}"#).unwrap();
        compressed.extend_from_slice(b"junk");
        let token = base64::encode(&TOKEN, &compressed).unwrap();
        assert!(matches!(decode(&token), Err(CodecError::DecompressFailure(_))));
    }

    #[test]
    fn size_limit() {
        let huge = vec![b' '; MAX_ENVELOPE_LEN + 1];
        let token = base64::encode(&TOKEN, &compress(&huge).unwrap()).unwrap();
        assert!(matches!(decode(&token), Err(CodecError::DecompressFailure(_))));

        // an envelope just under the limit is still a valid token
        let mut json = br#"{"data":"x","expire_after":0,"time":1,"sign":""}"#.to_vec();
        json.resize(MAX_ENVELOPE_LEN, b' ');
        let token = base64::encode(&TOKEN, &compress(&json).unwrap()).unwrap();
        assert_eq!(decode(&token).unwrap().data, "x");
    }

    #[test]
    fn not_json() {
        let token = token_from_json("definitely not json");
        assert!(matches!(decode(&token), Err(CodecError::ParseFailure(_))));
    }

    #[test]
    fn not_an_object() {
        let token = token_from_json(r#"["x", 0, 1, ""]"#);
        assert!(matches!(decode(&token), Err(CodecError::ParseFailure(_))));
    }

    #[test]
    fn wrong_field_types() {
        for json in [
            r#"{"data":1,"expire_after":0,"time":1}"#,
            r#"{"data":"x","expire_after":-1,"time":1}"#,
            r#"{"data":"x","expire_after":0,"time":"1"}"#,
            r#"{"data":"x","expire_after":0,"time":1,"sign":7}"#,
        ] {
            let token = token_from_json(json);
            assert!(
                matches!(decode(&token), Err(CodecError::ParseFailure(_))),
                "{json}"
            );
        }
    }

    #[test]
    fn missing_fields_in_order() {
        let cases = [
            (r#"{"expire_after":0,"time":1,"sign":""}"#, "data"),
            (r#"{"time":1,"sign":""}"#, "data"),
            (r#"{"data":"x","time":1,"sign":""}"#, "expire_after"),
            (r#"{"data":"x","expire_after":0,"sign":""}"#, "time"),
            (r#"{"data":"x","expire_after":0,"time":null,"sign":""}"#, "time"),
            (r#"{"data":"x","expire_after":0}"#, "time"),
        ];
        for (json, field) in cases {
            let token = token_from_json(json);
            assert!(
                matches!(decode(&token), Err(CodecError::MissingField(f)) if f == field),
                "{json}"
            );
        }
    }

    #[test]
    fn missing_sign_is_reported_separately() {
        let token = token_from_json(r#"{"data":"x","expire_after":0,"time":1}"#);
        let env = decode(&token).unwrap();
        assert!(matches!(env.signature(), Err(CodecError::MissingField("sign"))));
    }

    #[test]
    fn malformed_sign() {
        let token = token_from_json(r#"{"data":"x","expire_after":0,"time":1,"sign":"*--*"}"#);
        let env = decode(&token).unwrap();
        assert!(matches!(env.signature(), Err(CodecError::DecodeFailure)));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let token =
            token_from_json(r#"{"data":"x","expire_after":0,"time":1,"sign":"","kid":"a"}"#);
        assert_eq!(decode(&token).unwrap().data, "x");
    }

    #[test]
    fn token_shape() {
        let token = envelope("hello").encode().unwrap();
        let parsed: Token = token.as_str().parse().unwrap();
        assert_eq!(parsed, token);
        assert_eq!(parsed.inspect().unwrap().data, "hello");

        assert!("".parse::<Token>().is_err());
        assert!("abc".parse::<Token>().is_err());
        assert!("ab+=".parse::<Token>().is_err());
    }

    #[test]
    fn token_serde() {
        let token = envelope("hello").encode().unwrap();
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, format!("\"{token}\""));
        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
        assert!(serde_json::from_str::<Token>("\"a/b=\"").is_err());
    }
}
