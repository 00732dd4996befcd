//! UCS分类表
//!
//! 从CSV加载UCS分类，按文件名分类：
//! 文件名的CatID前缀精确命中时直接采用，否则按文件名与描述文本打分，
//! 取最高分为主分类，其后不低于最高分70%的最多5个为备选。
//! 加载后只读，由调用方显式传给导出器。

use crate::error::{AppError, AppResult};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

/// CatID列可接受的表头（不区分大小写）
const CAT_ID_HEADERS: &[&str] = &["catid", "id", "catshort"];
const CATEGORY_HEADER: &str = "category";
const SUBCATEGORY_HEADER: &str = "subcategory";
const FULL_NAME_HEADERS: &[&str] = &["fullname"];
const DESCRIPTION_HEADERS: &[&str] = &["description", "explanations"];
const KEYWORD_HEADERS: &[&str] = &["keywords", "synonyms - comma separated", "synonyms"];

/// 打分权重
mod weights {
    pub const FULL_NAME: f64 = 10.0;
    pub const CATEGORY: f64 = 5.0;
    pub const SUBCATEGORY: f64 = 7.0;
    pub const KEYWORD: f64 = 3.0;
    pub const NAME_WORD: f64 = 2.0;
    pub const CATEGORY_WORD: f64 = 1.5;
    pub const PARTIAL_WORD: f64 = 0.5;
}

/// 备选分类最多个数
pub const MAX_ALTERNATIVES: usize = 5;

/// 备选分类的最低分数（相对最高分的比例）
pub const ALTERNATIVE_RATIO: f64 = 0.7;

/// 一个UCS分类
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UcsCategory {
    pub cat_id: String,
    pub category: String,
    pub subcategory: String,
    /// 缺少FullName列时为 "Category SubCategory"
    pub full_name: String,
    pub description: String,
    pub keywords: Vec<String>,
}

/// 一个打分后的候选分类
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UcsMatch<'a> {
    pub category: &'a UcsCategory,
    pub score: f64,
}

/// 文件的分类结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UcsClassification<'a> {
    pub primary: UcsMatch<'a>,
    pub alternatives: Vec<UcsMatch<'a>>,
}

/// 只读的UCS分类查询表（按CatID排序，同分时顺序稳定）
#[derive(Debug, Clone, Default)]
pub struct UcsTable {
    entries: BTreeMap<String, UcsCategory>,
}

impl UcsTable {
    /// 从CSV文件加载
    pub fn load(path: &Path) -> AppResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            AppError::InvalidInput(format!("无法打开UCS分类表 {}: {e}", path.display()))
        })?;
        Self::from_reader(file)
    }

    /// 从任意CSV数据源加载
    ///
    /// 表头不区分大小写；缺少CatID/Category/SubCategory任一列时失败，
    /// FullName、Description/Explanations、Keywords/Synonyms为可选列。
    /// CatID为空的行被跳过，重复的CatID以最后一行为准。
    pub fn from_reader<R: Read>(reader: R) -> AppResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_ascii_lowercase())
            .collect();

        let find = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));
        let (Some(id_col), Some(cat_col), Some(sub_col)) = (
            find(CAT_ID_HEADERS),
            find(&[CATEGORY_HEADER]),
            find(&[SUBCATEGORY_HEADER]),
        ) else {
            return Err(AppError::InvalidInput(format!(
                "UCS分类表缺少必需列 (CatID, Category, SubCategory)，实际表头: {}",
                headers.join(", ")
            )));
        };
        let full_name_col = find(FULL_NAME_HEADERS);
        let description_col = find(DESCRIPTION_HEADERS);
        let keyword_col = find(KEYWORD_HEADERS);

        let mut entries = BTreeMap::new();
        for record in csv_reader.records() {
            let record = record?;
            let field = |col: Option<usize>| {
                col.and_then(|c| record.get(c))
                    .unwrap_or_default()
                    .to_string()
            };

            let cat_id = field(Some(id_col)).to_uppercase();
            if cat_id.is_empty() {
                continue;
            }
            let category = field(Some(cat_col));
            let subcategory = field(Some(sub_col));
            let full_name = match field(full_name_col) {
                name if name.is_empty() => format!("{category} {subcategory}").trim().to_string(),
                name => name,
            };
            let keywords = field(keyword_col)
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();

            let entry = UcsCategory {
                cat_id: cat_id.clone(),
                category,
                subcategory,
                full_name,
                description: field(description_col),
                keywords,
            };
            entries.insert(cat_id, entry);
        }

        log::debug!("UCS分类表加载完成: {} 条 / UCS entries loaded", entries.len());
        Ok(Self { entries })
    }

    /// 按文件名查询分类（CatID为第一个 `_` 之前的前缀）
    pub fn lookup(&self, file_name: &str) -> Option<&UcsCategory> {
        self.entries.get(&cat_id_of(file_name))
    }

    /// 为文件分类
    ///
    /// CatID前缀精确命中的分类总是主分类（分数照常计算），
    /// 否则取打分最高者。没有任何正分且无精确命中时返回None。
    pub fn classify(&self, file_name: &str, description: &str) -> Option<UcsClassification<'_>> {
        let text = match_text(file_name, description);
        let mut scored: Vec<UcsMatch<'_>> = self
            .entries
            .values()
            .map(|category| UcsMatch {
                category,
                score: match_score(&text, category),
            })
            .filter(|m| m.score > 0.0)
            .collect();
        // 稳定排序，同分按CatID顺序
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        let best = scored.first().map_or(0.0, |m| m.score);
        let primary = match self.lookup(file_name) {
            Some(exact) => match scored.iter().position(|m| m.category.cat_id == exact.cat_id) {
                Some(index) => scored.remove(index),
                None => UcsMatch {
                    category: exact,
                    score: 0.0,
                },
            },
            None if scored.is_empty() => return None,
            None => scored.remove(0),
        };

        let cutoff = best * ALTERNATIVE_RATIO;
        let alternatives = scored
            .into_iter()
            .take(MAX_ALTERNATIVES)
            .filter(|m| m.score >= cutoff)
            .collect();

        Some(UcsClassification {
            primary,
            alternatives,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 从文件名提取CatID（大写）
pub fn cat_id_of(file_name: &str) -> String {
    file_name
        .split('_')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// 打分用的文本：去掉扩展名，小写，`_` `-` `.` 视为空格
fn match_text(file_name: &str, description: &str) -> String {
    let lower = file_name.to_lowercase();
    let stem = lower
        .strip_suffix(".wave")
        .or_else(|| lower.strip_suffix(".wav"))
        .unwrap_or(&lower);
    format!("{stem} {}", description.to_lowercase())
        .replace(['_', '-', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn words(text: &str) -> BTreeSet<&str> {
    text.split_whitespace().collect()
}

fn char_len(word: &str) -> usize {
    word.chars().count()
}

/// 文本与一个分类的匹配分数
fn match_score(text: &str, entry: &UcsCategory) -> f64 {
    let full_name = entry.full_name.to_lowercase();
    let category = entry.category.to_lowercase();
    let subcategory = entry.subcategory.to_lowercase();
    let contains = |needle: &str| !needle.is_empty() && text.contains(needle);

    let mut score = 0.0;
    if contains(&full_name) {
        score += weights::FULL_NAME;
    }
    if contains(&category) {
        score += weights::CATEGORY;
    }
    if contains(&subcategory) {
        score += weights::SUBCATEGORY;
    }
    for keyword in &entry.keywords {
        if contains(&keyword.to_lowercase()) {
            score += weights::KEYWORD;
        }
    }

    let text_words = words(text);
    let name_words = words(&full_name);
    let category_words = words(&category);
    let subcategory_words = words(&subcategory);

    for word in text_words.iter().filter(|w| char_len(w) > 2) {
        if name_words.contains(word) {
            score += weights::NAME_WORD;
        } else if category_words.contains(word) || subcategory_words.contains(word) {
            score += weights::CATEGORY_WORD;
        }
    }

    // 部分词匹配
    for word in text_words.iter().filter(|w| char_len(w) > 3) {
        for name in name_words.iter().filter(|n| char_len(n) > 3) {
            if word.contains(name) || name.contains(word) {
                score += weights::PARTIAL_WORD;
            }
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Category,SubCategory,CatID,CatShort\n\
                          AIR,BLOW,AIRBlow,AIR\n\
                          DOORS,WOOD,DOORWood,DOOR\n";

    #[test]
    fn test_cat_id_prefix() {
        assert_eq!(cat_id_of("doorWood_Slam Heavy_01.wav"), "DOORWOOD");
        assert_eq!(cat_id_of("nounderscore.wav"), "NOUNDERSCORE.WAV");
        assert_eq!(cat_id_of(""), "");
    }

    #[test]
    fn test_lookup_is_case_insensitive_on_file_name() {
        let table = UcsTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);

        let hit = table.lookup("doorwood_Slam_01.wav").unwrap();
        assert_eq!(hit.category, "DOORS");
        assert_eq!(hit.subcategory, "WOOD");

        assert!(table.lookup("UNKNOWN_thing.wav").is_none());
    }

    #[test]
    fn test_headers_case_insensitive() {
        let csv = "CATID,category,SUBCATEGORY\nfolyCloth,FOLEY,CLOTH\n";
        let table = UcsTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.lookup("FOLYCloth_rustle.wav").unwrap().category, "FOLEY");
    }

    #[test]
    fn test_missing_columns_rejected() {
        let csv = "Name,Category\nfoo,bar\n";
        assert!(matches!(
            UcsTable::from_reader(csv.as_bytes()),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_blank_ids_skipped() {
        let csv = "CatID,Category,SubCategory\n,EMPTY,EMPTY\nAIRBlow,AIR,BLOW\n";
        let table = UcsTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
    }

    const SCORING: &str = "CatID,Category,SubCategory,FullName,Keywords,Explanations\n\
                           DOORWood,DOORS,WOOD,Doors Wood,\"creak, slam\",Wooden doors\n\
                           DOORMetl,DOORS,METAL,Doors Metal,\"clang,slam\",Metal doors\n\
                           DOORSqk,DOORS,SQUEAK,Doors Squeak,\"squeak,creak\",Squeaky hinges\n\
                           WATRSurf,WATER,SURF,Water Surf,\"waves,ocean\",Breaking waves\n";

    #[test]
    fn test_optional_columns_loaded() {
        let table = UcsTable::from_reader(SCORING.as_bytes()).unwrap();
        let wood = table.lookup("DOORWood_x.wav").unwrap();
        assert_eq!(wood.full_name, "Doors Wood");
        assert_eq!(wood.description, "Wooden doors");
        assert_eq!(wood.keywords, vec!["creak", "slam"]);

        let csv = "CatID,Category,SubCategory,Synonyms - Comma Separated\nAIRBlow,AIR,BLOW,\"gust, , wind\"\n";
        let table = UcsTable::from_reader(csv.as_bytes()).unwrap();
        let air = table.lookup("AIRBlow_x.wav").unwrap();
        assert_eq!(air.full_name, "AIR BLOW");
        assert_eq!(air.keywords, vec!["gust", "wind"]);
        assert!(air.description.is_empty());
    }

    #[test]
    fn test_match_text_normalization() {
        assert_eq!(match_text("Door_Slam-01.take.WAV", ""), "door slam 01 take");
        assert_eq!(match_text("x.wave", "Big  Boom"), "x big boom");
    }

    #[test]
    fn test_scores_rank_and_cutoff() {
        let table = UcsTable::from_reader(SCORING.as_bytes()).unwrap();
        // DOORMETL: metal子类 7 + slam 3 + 名称词 2 + 部分词 1 = 13
        // DOORWOOD: wood子类 7 + slam 3 + 部分词 1 = 11（≥ 13×0.7）
        // DOORSQK: 部分词 0.5（低于阈值）
        let result = table.classify("wooden_door_slam.wav", "Metal").unwrap();

        assert_eq!(result.primary.category.cat_id, "DOORMETL");
        assert_eq!(result.primary.score, 13.0);
        let alternatives: Vec<(&str, f64)> = result
            .alternatives
            .iter()
            .map(|m| (m.category.cat_id.as_str(), m.score))
            .collect();
        assert_eq!(alternatives, vec![("DOORWOOD", 11.0)]);
    }

    #[test]
    fn test_exact_cat_id_wins_over_scores() {
        let table = UcsTable::from_reader(SCORING.as_bytes()).unwrap();
        let result = table.classify("DOORSqk_01.wav", "").unwrap();

        assert_eq!(result.primary.category.cat_id, "DOORSQK");
        assert_eq!(result.primary.score, 5.5);
        let ids: Vec<&str> = result
            .alternatives
            .iter()
            .map(|m| m.category.cat_id.as_str())
            .collect();
        assert_eq!(ids, vec!["DOORMETL", "DOORWOOD"]);
    }

    #[test]
    fn test_alternatives_capped_at_five() {
        let mut csv = String::from("CatID,Category,SubCategory\n");
        for tag in ["A", "B", "C", "D", "E", "F", "G"] {
            csv.push_str(&format!("TEST{tag},TEST,X{tag}\n"));
        }
        let table = UcsTable::from_reader(csv.as_bytes()).unwrap();
        let result = table.classify("test_tone.wav", "").unwrap();

        assert_eq!(result.primary.category.cat_id, "TESTA");
        assert_eq!(result.alternatives.len(), MAX_ALTERNATIVES);
        assert!(result
            .alternatives
            .iter()
            .all(|m| m.score == result.primary.score));
    }

    #[test]
    fn test_no_positive_score_is_unclassified() {
        let table = UcsTable::from_reader(SCORING.as_bytes()).unwrap();
        assert!(table.classify("ambience.wav", "").is_none());
        assert!(UcsTable::default().classify("DOORWood_x.wav", "slam").is_none());
    }
}
