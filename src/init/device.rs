//! Root device specifier resolution.
//!
//! A specifier is either a literal device path or a tagged form
//! (`LABEL=`, `UUID=`, `PARTLABEL=`, `PARTUUID=`; prefixes are exact and
//! case-sensitive). Tagged specifiers are resolved to a device path through
//! a `BlockResolver`; the production resolver shells out to `findfs`.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::process::Cmd;

/// Tag kinds a device specifier can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Label,
    Uuid,
    PartLabel,
    PartUuid,
}

impl Tag {
    /// The on-cmdline prefix, without the trailing `=`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Label => "LABEL",
            Tag::Uuid => "UUID",
            Tag::PartLabel => "PARTLABEL",
            Tag::PartUuid => "PARTUUID",
        }
    }
}

/// A parsed root device specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSpec {
    /// A literal device path, used as-is.
    Path(String),
    /// A tagged specifier to resolve through a lookup utility.
    Tagged { tag: Tag, value: String },
}

impl DeviceSpec {
    /// Parse a specifier string from the kernel command line.
    pub fn parse(spec: &str) -> Self {
        // Longer prefixes first: "PARTUUID=" also starts with no other tag,
        // but "UUID=" must not swallow "PARTUUID=".
        const TAGS: &[(&str, Tag)] = &[
            ("PARTUUID=", Tag::PartUuid),
            ("PARTLABEL=", Tag::PartLabel),
            ("LABEL=", Tag::Label),
            ("UUID=", Tag::Uuid),
        ];

        for (prefix, tag) in TAGS {
            if let Some(value) = spec.strip_prefix(prefix) {
                return DeviceSpec::Tagged {
                    tag: *tag,
                    value: value.to_string(),
                };
            }
        }
        DeviceSpec::Path(spec.to_string())
    }

    /// Resolve to a concrete device path.
    pub fn resolve(&self, resolver: &dyn BlockResolver) -> Result<PathBuf> {
        match self {
            DeviceSpec::Path(path) => Ok(PathBuf::from(path)),
            DeviceSpec::Tagged { tag, value } => resolver.resolve(*tag, value),
        }
    }
}

/// Looks up a block device by tag.
pub trait BlockResolver {
    fn resolve(&self, tag: Tag, value: &str) -> Result<PathBuf>;
}

/// Resolver backed by the `findfs` utility from the mounted ramdisk.
pub struct FindfsResolver;

impl BlockResolver for FindfsResolver {
    fn resolve(&self, tag: Tag, value: &str) -> Result<PathBuf> {
        let result = Cmd::new("/sbin/findfs")
            .arg(format!("{}={}", tag.as_str(), value))
            .error_msg(format!("findfs could not resolve {}={}", tag.as_str(), value))
            .run()
            .context("findfs failed")?;

        let path = result.stdout_trimmed();
        if path.is_empty() {
            bail!("findfs returned no device for {}={}", tag.as_str(), value);
        }
        Ok(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records what it was asked to resolve.
    struct RecordingResolver {
        calls: RefCell<Vec<(Tag, String)>>,
        answer: PathBuf,
    }

    impl RecordingResolver {
        fn new(answer: &str) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                answer: PathBuf::from(answer),
            }
        }
    }

    impl BlockResolver for RecordingResolver {
        fn resolve(&self, tag: Tag, value: &str) -> Result<PathBuf> {
            self.calls.borrow_mut().push((tag, value.to_string()));
            Ok(self.answer.clone())
        }
    }

    #[test]
    fn test_literal_path_bypasses_resolver() {
        let resolver = RecordingResolver::new("/dev/unused");
        let spec = DeviceSpec::parse("/dev/mmcblk0p2");
        let dev = spec.resolve(&resolver).unwrap();
        assert_eq!(dev, PathBuf::from("/dev/mmcblk0p2"));
        assert!(resolver.calls.borrow().is_empty());
    }

    #[test]
    fn test_partuuid_prefix_is_stripped() {
        let resolver = RecordingResolver::new("/dev/mmcblk0p2");
        let spec = DeviceSpec::parse("PARTUUID=1234-5678");
        let dev = spec.resolve(&resolver).unwrap();
        assert_eq!(dev, PathBuf::from("/dev/mmcblk0p2"));
        assert_eq!(
            *resolver.calls.borrow(),
            vec![(Tag::PartUuid, "1234-5678".to_string())]
        );
    }

    #[test]
    fn test_uuid_does_not_swallow_partuuid() {
        match DeviceSpec::parse("PARTUUID=abcd") {
            DeviceSpec::Tagged { tag, value } => {
                assert_eq!(tag, Tag::PartUuid);
                assert_eq!(value, "abcd");
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_all_tag_prefixes() {
        for (input, tag, value) in [
            ("LABEL=rootfs", Tag::Label, "rootfs"),
            ("UUID=aa-bb", Tag::Uuid, "aa-bb"),
            ("PARTLABEL=system", Tag::PartLabel, "system"),
            ("PARTUUID=11-22", Tag::PartUuid, "11-22"),
        ] {
            assert_eq!(
                DeviceSpec::parse(input),
                DeviceSpec::Tagged {
                    tag,
                    value: value.to_string()
                }
            );
        }
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        // Lowercase is not a tag; it is a (strange) literal path.
        assert_eq!(
            DeviceSpec::parse("label=rootfs"),
            DeviceSpec::Path("label=rootfs".to_string())
        );
        assert_eq!(
            DeviceSpec::parse("uuid=aa"),
            DeviceSpec::Path("uuid=aa".to_string())
        );
    }
}
