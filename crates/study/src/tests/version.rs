// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{StudyError, StudyVersion};

#[test]
fn test_known_versions_parse() {
    assert_eq!(StudyVersion::parse(870).unwrap(), StudyVersion::V8_7);
    assert_eq!(StudyVersion::parse(600).unwrap().value(), 600);
}

#[test]
fn test_unknown_version_is_rejected() {
    assert_eq!(StudyVersion::parse(875), Err(StudyError::UnknownVersion(875)));
}

#[test]
fn test_versions_are_ordered() {
    assert!(StudyVersion::V8_2 < StudyVersion::V8_7);
    assert!(StudyVersion::V6_5 > StudyVersion::V6_0);
}

#[test]
fn test_version_display() {
    assert_eq!(StudyVersion::V8_6.to_string(), "8.6");
}

#[test]
fn test_version_serializes_as_number() {
    let json: String = serde_json::to_string(&StudyVersion::V8_2).unwrap();
    assert_eq!(json, "820");

    let parsed: Result<StudyVersion, _> = serde_json::from_str::<StudyVersion>("123");
    assert!(parsed.is_err());
}
