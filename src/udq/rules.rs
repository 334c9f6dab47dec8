use std::sync::LazyLock;

use regex::Regex;

/// 平台属性名中用来代替 `.` 的字符
pub const PROPERTY_SEPARATOR: char = '_';

/// 引擎中度量名称使用的层级分隔符，平台的命名规则不允许出现
pub const MEASURE_SEPARATOR: char = '.';

/// 平台属性名中不允许出现的字符，推断 schema 时都会被替换成 `_`
pub const ILLEGAL_CHARACTERS: [char; 5] = ['#', '(', ')', ' ', '.'];

static PROPERTY_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid property name regex"));

/// 平台属性名转换为引擎中的度量名称：`Vehicle_Speed` -> `Vehicle.Speed`
pub fn to_measure_name(property_name: &str) -> String {
    property_name.replace(PROPERTY_SEPARATOR, &MEASURE_SEPARATOR.to_string())
}

/// 引擎中的度量名称转换为平台属性名：`Vehicle.Speed` -> `Vehicle_Speed`
pub fn to_property_name(measure_name: &str) -> String {
    measure_name.replace(MEASURE_SEPARATOR, &PROPERTY_SEPARATOR.to_string())
}

/// 验证拼接进查询语句之前的属性名
///
/// - 只能由英文字母、数字和下划线组成
/// - 不能为空
pub fn validate_property_name(name: &str) -> bool {
    PROPERTY_NAME_RE.is_match(name)
}

/// 把非法字符替换成 `_`，然后把连续的 `_` 合并成一个。
/// 结果中不会出现 [`ILLEGAL_CHARACTERS`]，再次调用结果不变
pub fn canonicalize_property_name(name: &str) -> String {
    let mut s = String::with_capacity(name.len());

    for c in name.chars() {
        let c = if ILLEGAL_CHARACTERS.contains(&c) { PROPERTY_SEPARATOR } else { c };

        if c == PROPERTY_SEPARATOR && s.ends_with(PROPERTY_SEPARATOR) {
            continue;
        }

        s.push(c);
    }

    s
}

/// 生成 SQL 字符串字面量，内部的单引号会被转义
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod test_rules {
    use super::{canonicalize_property_name, quote_literal, to_measure_name, to_property_name, validate_property_name};

    #[test]
    fn test_name_round_trip() {
        for measure in ["Vehicle.Speed", "Vehicle.Powertrain.Battery.StateOfHealth", "Vehicle.InCabinTemperature", "Speed"] {
            let encoded = to_property_name(measure);
            assert!(!encoded.contains('.'));
            assert_eq!(measure, to_measure_name(&encoded));
            assert_eq!(encoded, to_property_name(&to_measure_name(&encoded)));
        }
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!("Vehicle_Speed", canonicalize_property_name("Vehicle.Speed"));
        assert_eq!("Battery_Temp_C_", canonicalize_property_name("Battery Temp (C)"));
        assert_eq!("Module_1_Temp", canonicalize_property_name("Module #1.Temp"));
        assert_eq!("a_b", canonicalize_property_name("a___b"));
        assert_eq!("", canonicalize_property_name(""));
    }

    #[test]
    fn test_canonicalize_idempotent() {
        for name in ["Vehicle.Speed", "a . b", "x__.__y", "(#)", "___", "Vehicle_Powertrain_Battery_Module_1_Temperature"] {
            let once = canonicalize_property_name(name);
            assert_eq!(once, canonicalize_property_name(&once), "canonicalize is not idempotent for {:?}", name);
        }
    }

    #[test]
    fn test_validate_property_name() {
        assert!(validate_property_name("Vehicle_Speed"));
        assert!(validate_property_name("p0"));
        assert!(!validate_property_name(""));
        assert!(!validate_property_name("Vehicle.Speed"));
        assert!(!validate_property_name("x' OR '1'='1"));
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!("'Vehicle7'", quote_literal("Vehicle7"));
        assert_eq!("'O''Brien'", quote_literal("O'Brien"));
    }
}
