//! Bidirectional snake_case ⇄ camelCase identifier transforms.
//!
//! `to_camel` and `to_snake` are exact inverses for identifiers over
//! `[a-z0-9_]` (snake side) and `[a-zA-Z0-9]` without consecutive capitals
//! (camel side), which covers every field name in the schemas this layer
//! serves. Round-tripping is a tested property.

/// `create_time` → `createTime`. Already-camel input passes through.
#[must_use]
pub fn to_camel(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = false;
    for c in s.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// `createTime` → `create_time`. Already-snake input passes through.
#[must_use]
pub fn to_snake(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_basic() {
        assert_eq!(to_camel("create_time"), "createTime");
        assert_eq!(to_camel("cover_img_url"), "coverImgUrl");
        assert_eq!(to_camel("id"), "id");
        assert_eq!(to_camel("is_deleted"), "isDeleted");
    }

    #[test]
    fn snake_basic() {
        assert_eq!(to_snake("createTime"), "create_time");
        assert_eq!(to_snake("coverImgUrl"), "cover_img_url");
        assert_eq!(to_snake("id"), "id");
    }

    #[test]
    fn digits_survive() {
        assert_eq!(to_camel("field_1"), "field1");
        assert_eq!(to_snake("level2Name"), "level2_name");
    }

    #[test]
    fn round_trip_over_schema_field_names() {
        let fields = [
            "id",
            "name",
            "status",
            "create_time",
            "update_time",
            "is_deleted",
            "cover_img_url",
            "exercise_ids",
            "playlist_config",
            "execution_rest_audio_end_time",
            "music_audio_duration",
            "sort_order",
        ];
        for field in fields {
            let camel = to_camel(field);
            assert_eq!(to_snake(&camel), field, "round trip failed for {field}");
            assert_eq!(
                to_camel(&to_snake(&camel)),
                camel,
                "camel fixpoint failed for {field}"
            );
        }
    }
}
