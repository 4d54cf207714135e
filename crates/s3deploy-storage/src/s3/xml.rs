//! Parsing of S3 XML response bodies.

use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::{StorageError, StorageResult};
use crate::store::ListPage;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    contents: Vec<ListEntry>,
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListEntry {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ErrorDocument {
    pub(crate) code: String,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

/// Parse a `ListObjectsV2` response body.
pub(crate) fn parse_list_result(body: &str) -> StorageResult<ListPage> {
    if !body.contains("<ListBucketResult") {
        return Err(StorageError::InvalidResponse {
            operation: "s3.list_objects",
            reason: "missing ListBucketResult element",
            detail: None,
        });
    }
    let result: ListBucketResult =
        from_str(body).map_err(|err| StorageError::InvalidResponse {
            operation: "s3.list_objects",
            reason: "malformed listing document",
            detail: Some(err.to_string()),
        })?;

    let next_continuation = if result.is_truncated {
        result
            .next_continuation_token
            .filter(|token| !token.is_empty())
    } else {
        None
    };
    Ok(ListPage {
        keys: result.contents.into_iter().map(|entry| entry.key).collect(),
        next_continuation,
    })
}

/// Parse an S3 `<Error>` document; `None` when the body is not one.
pub(crate) fn parse_error_document(body: &str) -> Option<ErrorDocument> {
    if !body.contains("<Error") {
        return None;
    }
    from_str::<ErrorDocument>(body)
        .ok()
        .filter(|doc| !doc.code.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUNCATED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>releases</Name>
  <Prefix></Prefix>
  <KeyCount>2</KeyCount>
  <MaxKeys>2</MaxKeys>
  <IsTruncated>true</IsTruncated>
  <NextContinuationToken>token-2</NextContinuationToken>
  <Contents>
    <Key>web/web-1.0.zip</Key>
    <Size>120</Size>
  </Contents>
  <Contents>
    <Key>web/web-1.1.zip</Key>
    <Size>130</Size>
  </Contents>
</ListBucketResult>"#;

    #[test]
    fn parses_truncated_listing() -> anyhow::Result<()> {
        let page = parse_list_result(TRUNCATED)?;
        assert_eq!(page.keys, vec!["web/web-1.0.zip", "web/web-1.1.zip"]);
        assert_eq!(page.next_continuation.as_deref(), Some("token-2"));
        Ok(())
    }

    #[test]
    fn parses_empty_final_listing() -> anyhow::Result<()> {
        let body = r"<ListBucketResult><Name>releases</Name><KeyCount>0</KeyCount><IsTruncated>false</IsTruncated></ListBucketResult>";
        let page = parse_list_result(body)?;
        assert!(page.keys.is_empty());
        assert!(page.next_continuation.is_none());
        Ok(())
    }

    #[test]
    fn rejects_non_listing_body() {
        let err = parse_list_result("<html>proxy error</html>").unwrap_err();
        assert!(matches!(err, StorageError::InvalidResponse { .. }));
    }

    #[test]
    fn parses_error_document() {
        let body = r"<?xml version='1.0' encoding='UTF-8'?><Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message><Key>a</Key></Error>";
        let doc = parse_error_document(body).expect("error document");
        assert_eq!(doc.code, "NoSuchKey");
        assert_eq!(
            doc.message.as_deref(),
            Some("The specified key does not exist.")
        );
        assert!(parse_error_document("").is_none());
        assert!(parse_error_document("<Foo/>").is_none());
    }
}
