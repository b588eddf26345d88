//! Static reference tables: county/city selectors, rail operators and road
//! classes, plus selector validation against them.

use tracing::warn;

use crate::error::{Result, TdxError};

/// Selector literal for intercity (highway) bus services.
pub const INTERCITY: &str = "Intercity";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct County {
    /// Selector used in resource URLs, e.g. `NewTaipei`.
    pub code: &'static str,
    pub name_zh: &'static str,
    pub name_en: &'static str,
    /// Three-letter city code, e.g. `NWT`.
    pub city_code: &'static str,
}

/// How an operator's data is structured on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RailSystem {
    /// Taiwan Railway (version-3 endpoints).
    Conventional,
    /// Alishan Forest Railway (version-3 endpoints, reduced schema).
    Forest,
    HighSpeed,
    Metro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    pub code: &'static str,
    pub name_zh: &'static str,
    pub name_en: &'static str,
    pub system: RailSystem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoadClass {
    pub code: u8,
    pub name_zh: &'static str,
    pub name_en: &'static str,
}

const COUNTIES: [County; 22] = [
    County { code: "Taipei", name_zh: "臺北市", name_en: "Taipei City", city_code: "TPE" },
    County { code: "NewTaipei", name_zh: "新北市", name_en: "New Taipei City", city_code: "NWT" },
    County { code: "Taoyuan", name_zh: "桃園市", name_en: "Taoyuan City", city_code: "TAO" },
    County { code: "Taichung", name_zh: "臺中市", name_en: "Taichung City", city_code: "TXG" },
    County { code: "Tainan", name_zh: "臺南市", name_en: "Tainan City", city_code: "TNN" },
    County { code: "Kaohsiung", name_zh: "高雄市", name_en: "Kaohsiung City", city_code: "KHH" },
    County { code: "Keelung", name_zh: "基隆市", name_en: "Keelung City", city_code: "KEE" },
    County { code: "Hsinchu", name_zh: "新竹市", name_en: "Hsinchu City", city_code: "HSZ" },
    County { code: "HsinchuCounty", name_zh: "新竹縣", name_en: "Hsinchu County", city_code: "HSQ" },
    County { code: "MiaoliCounty", name_zh: "苗栗縣", name_en: "Miaoli County", city_code: "MIA" },
    County { code: "ChanghuaCounty", name_zh: "彰化縣", name_en: "Changhua County", city_code: "CHA" },
    County { code: "NantouCounty", name_zh: "南投縣", name_en: "Nantou County", city_code: "NAN" },
    County { code: "YunlinCounty", name_zh: "雲林縣", name_en: "Yunlin County", city_code: "YUN" },
    County { code: "ChiayiCounty", name_zh: "嘉義縣", name_en: "Chiayi County", city_code: "CYQ" },
    County { code: "Chiayi", name_zh: "嘉義市", name_en: "Chiayi City", city_code: "CYI" },
    County { code: "PingtungCounty", name_zh: "屏東縣", name_en: "Pingtung County", city_code: "PIF" },
    County { code: "YilanCounty", name_zh: "宜蘭縣", name_en: "Yilan County", city_code: "ILA" },
    County { code: "HualienCounty", name_zh: "花蓮縣", name_en: "Hualien County", city_code: "HUA" },
    County { code: "TaitungCounty", name_zh: "臺東縣", name_en: "Taitung County", city_code: "TTT" },
    County { code: "KinmenCounty", name_zh: "金門縣", name_en: "Kinmen County", city_code: "KIN" },
    County { code: "PenghuCounty", name_zh: "澎湖縣", name_en: "Penghu County", city_code: "PEN" },
    County { code: "LienchiangCounty", name_zh: "連江縣", name_en: "Lienchiang County", city_code: "LIE" },
];

const OPERATORS: [Operator; 9] = [
    Operator { code: "TRA", name_zh: "臺灣鐵路", name_en: "Taiwan Railway", system: RailSystem::Conventional },
    Operator { code: "THSR", name_zh: "台灣高鐵", name_en: "Taiwan High Speed Rail", system: RailSystem::HighSpeed },
    Operator { code: "TRTC", name_zh: "臺北捷運", name_en: "Taipei Metro", system: RailSystem::Metro },
    Operator { code: "KRTC", name_zh: "高雄捷運", name_en: "Kaohsiung Metro", system: RailSystem::Metro },
    Operator { code: "TYMC", name_zh: "桃園捷運", name_en: "Taoyuan Metro", system: RailSystem::Metro },
    Operator { code: "KLRT", name_zh: "高雄輕軌", name_en: "Kaohsiung Light Rail", system: RailSystem::Metro },
    Operator { code: "NTDLRT", name_zh: "淡海輕軌", name_en: "Danhai Light Rail", system: RailSystem::Metro },
    Operator { code: "TMRT", name_zh: "臺中捷運", name_en: "Taichung Metro", system: RailSystem::Metro },
    Operator { code: "AFR", name_zh: "阿里山林業鐵路", name_en: "Alishan Forest Railway", system: RailSystem::Forest },
];

const ROAD_CLASSES: [RoadClass; 8] = [
    RoadClass { code: 0, name_zh: "國道", name_en: "Freeway" },
    RoadClass { code: 1, name_zh: "省道快速公路", name_en: "Provincial expressway" },
    RoadClass { code: 2, name_zh: "省道一般公路", name_en: "Provincial highway" },
    RoadClass { code: 3, name_zh: "縣道", name_en: "County road" },
    RoadClass { code: 4, name_zh: "鄉道", name_en: "Township road" },
    RoadClass { code: 5, name_zh: "市區快速道路", name_en: "Urban expressway" },
    RoadClass { code: 6, name_zh: "市區一般道路", name_en: "Urban road" },
    RoadClass { code: 7, name_zh: "連絡道", name_en: "Connecting road" },
];

pub fn county_codes() -> &'static [County] {
    &COUNTIES
}

pub fn operator_codes() -> &'static [Operator] {
    &OPERATORS
}

pub fn road_classes() -> &'static [RoadClass] {
    &ROAD_CLASSES
}

/// A validated bus-area selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    City(&'static County),
    Intercity,
}

impl Area {
    /// Path suffix of the resource URL, e.g. `City/Taipei` or `InterCity`.
    pub fn path(&self) -> String {
        match self {
            Area::City(county) => format!("City/{}", county.code),
            Area::Intercity => "InterCity".to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Area::City(county) => county.code,
            Area::Intercity => INTERCITY,
        }
    }
}

/// Validates a bus selector. With `allow_intercity`, the [`INTERCITY`]
/// literal is accepted as well as the county codes.
pub fn area(selector: &str, allow_intercity: bool) -> Result<Area> {
    if allow_intercity && selector == INTERCITY {
        return Ok(Area::Intercity);
    }
    if let Some(county) = COUNTIES.iter().find(|c| c.code == selector) {
        return Ok(Area::City(county));
    }

    let mut valid: Vec<String> = COUNTIES.iter().map(|c| c.code.to_string()).collect();
    if allow_intercity {
        valid.push(INTERCITY.to_string());
    }
    Err(invalid("county", selector, valid))
}

pub fn operator(code: &str) -> Result<&'static Operator> {
    OPERATORS.iter().find(|o| o.code == code).ok_or_else(|| {
        invalid(
            "operator",
            code,
            OPERATORS.iter().map(|o| o.code.to_string()).collect(),
        )
    })
}

fn invalid(kind: &'static str, value: &str, valid: Vec<String>) -> TdxError {
    warn!(kind, value, valid = %valid.join(", "), "Invalid selector");
    TdxError::InvalidSelector {
        kind,
        value: value.to_string(),
        valid,
    }
}
