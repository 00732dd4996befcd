//! 简化的AAF-XML导出
//!
//! 每个输入文件生成一个文档：`AAF` 根 → `Header` → `ContentStorage/MasterMob`，
//! MasterMob下包含bext、UCS分类和一个音频 `TimelineMobSlot`。
//! 不是完整的AAF对象模型，只承载交换所需的元数据。

use crate::core::WavMetadata;
use crate::error::{AppResult, output_error};
use crate::tools::ucs::{UcsMatch, UcsTable};
use chrono::{DateTime, Local, SecondsFormat};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// AAF-XML命名空间
pub const AAF_NAMESPACE: &str = "http://www.aafassociation.org/aafxml";

/// 文档版本
pub const AAF_VERSION: &str = "1.1";

/// 导出文件后缀
pub const AAF_XML_EXTENSION: &str = "aaf.xml";

const GENERATOR: &str = concat!("wavmeta v", env!("CARGO_PKG_VERSION"));

/// 由文件名派生的确定性MobID（`urn:uuid:` 形式）
pub fn mob_id(file_name: &str) -> String {
    let hash = blake3::hash(file_name.as_bytes());
    let hex = hash.to_hex();
    format!(
        "urn:uuid:{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// XML 1.0允许的字符：排除制表符、换行、回车以外的C0控制字符，以及U+FFFE、U+FFFF
fn is_xml_char(c: char) -> bool {
    !matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}'
    )
}

/// 去除XML 1.0不允许出现的字符
pub fn xml_safe(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

fn timestamp(t: &DateTime<Local>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// 对quick-xml写入器的薄封装，统一错误转换
struct XmlOut {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> AppResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| output_error("XML写入失败", e))
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> AppResult<()> {
        let mut start = BytesStart::new(name);
        for &(key, value) in attrs {
            start.push_attribute((key, xml_safe(value).as_ref()));
        }
        self.event(Event::Start(start))
    }

    fn close(&mut self, name: &str) -> AppResult<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// `<name>text</name>`
    fn text(&mut self, name: &str, text: &str) -> AppResult<()> {
        self.open(name, &[])?;
        self.event(Event::Text(BytesText::new(&xml_safe(text))))?;
        self.close(name)
    }

    fn into_string(self) -> AppResult<String> {
        String::from_utf8(self.writer.into_inner().into_inner())
            .map_err(|e| output_error("XML编码失败", e))
    }
}

/// 生成单个文件的AAF-XML文档
///
/// `file_path` 写入 `FileReference`；`generated_at` 作为文档生成时间。
pub fn to_aaf_xml(
    meta: &WavMetadata,
    file_path: &Path,
    ucs: Option<&UcsTable>,
    generated_at: DateTime<Local>,
) -> AppResult<String> {
    let generated = timestamp(&generated_at);
    let mob = mob_id(&meta.file_name);
    let mut out = XmlOut::new();

    out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    out.open(
        "AAF",
        &[
            ("xmlns", AAF_NAMESPACE),
            ("version", AAF_VERSION),
            ("generator", GENERATOR),
            ("timestamp", generated.as_str()),
        ],
    )?;

    out.open("Header", &[])?;
    out.text("Version", AAF_VERSION)?;
    out.text("Generator", GENERATOR)?;
    out.text("CreationTime", &generated)?;
    out.close("Header")?;

    out.open("ContentStorage", &[])?;
    out.open("MasterMob", &[("MobID", mob.as_str())])?;
    out.text("Name", &meta.file_name)?;
    out.text(
        "CreationTime",
        &meta.created_time.as_ref().map(timestamp).unwrap_or_default(),
    )?;
    out.text(
        "LastModified",
        &meta.modified_time.as_ref().map(timestamp).unwrap_or_default(),
    )?;

    write_bext(&mut out, meta)?;

    let description = meta
        .bext
        .as_ref()
        .map(|b| b.description.as_str())
        .unwrap_or_default();
    if let Some(result) = ucs.and_then(|table| table.classify(&meta.file_name, description)) {
        out.open("UCSMetadata", &[])?;
        write_category(&mut out, "PrimaryCategory", &result.primary)?;
        if !result.alternatives.is_empty() {
            out.open("AlternativeCategories", &[])?;
            for alternative in &result.alternatives {
                write_category(&mut out, "Category", alternative)?;
            }
            out.close("AlternativeCategories")?;
        }
        out.close("UCSMetadata")?;
    }

    let sample_rate = meta.sample_rate.to_string();
    out.open("TimelineMobSlot", &[("SlotID", "1")])?;
    out.text("SlotName", "Audio")?;
    out.text("EditRate", &sample_rate)?;

    out.open("SourceClip", &[])?;
    out.text("StartTime", "0")?;
    out.text("Length", &meta.sample_frames.to_string())?;

    out.open("AudioProperties", &[])?;
    out.text("SampleRate", &sample_rate)?;
    out.text("Channels", &meta.channels.to_string())?;
    out.text("SampleWidth", &meta.bits_per_sample.div_ceil(8).to_string())?;
    out.text("Duration", &meta.timecode.to_string())?;
    out.text("FileSize", &meta.file_size.to_string())?;
    out.close("AudioProperties")?;

    out.open("FileReference", &[])?;
    out.text("FileName", &meta.file_name)?;
    out.text("FilePath", &file_path.to_string_lossy())?;
    out.close("FileReference")?;

    out.close("SourceClip")?;
    out.close("TimelineMobSlot")?;
    out.close("MasterMob")?;
    out.close("ContentStorage")?;
    out.close("AAF")?;

    out.into_string()
}

/// BextMetadata：只写非空字段
fn write_bext(out: &mut XmlOut, meta: &WavMetadata) -> AppResult<()> {
    let Some(bext) = &meta.bext else {
        return Ok(());
    };

    let mut fields: Vec<(&str, String)> = vec![
        ("Description", bext.description.clone()),
        ("Originator", bext.originator.clone()),
        ("OriginatorReference", bext.originator_reference.clone()),
        ("OriginationDate", bext.origination_date.clone()),
        ("OriginationTime", bext.origination_time.clone()),
        ("TimeReference", bext.time_reference.to_string()),
        ("Version", bext.version.to_string()),
    ];
    if !bext.umid.is_zero() {
        fields.push(("UMID", bext.umid.to_hex()));
    }
    if let Some(loudness) = &bext.loudness {
        let slots = [
            ("LoudnessValue", loudness.integrated),
            ("LoudnessRange", loudness.range),
            ("MaxTruePeakLevel", loudness.true_peak),
            ("MaxMomentaryLoudness", loudness.max_momentary),
            ("MaxShortTermLoudness", loudness.max_short_term),
        ];
        fields.extend(
            slots
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v.to_string()))),
        );
    }
    fields.push(("CodingHistory", bext.coding_history.clone()));

    out.open("BextMetadata", &[])?;
    for (name, value) in fields.iter().filter(|(_, v)| !v.is_empty()) {
        out.text(name, value)?;
    }
    out.close("BextMetadata")
}

fn write_category(out: &mut XmlOut, element: &str, hit: &UcsMatch<'_>) -> AppResult<()> {
    out.open(element, &[])?;
    out.text("ID", &hit.category.cat_id)?;
    out.text("FullName", &hit.category.full_name)?;
    out.text("Category", &hit.category.category)?;
    out.text("SubCategory", &hit.category.subcategory)?;
    out.text("MatchScore", &format!("{:.1}", hit.score))?;
    out.close(element)
}

/// 导出文件名：`<stem>.aaf.xml`
pub fn output_file_name(meta: &WavMetadata) -> String {
    format!("{}.{AAF_XML_EXTENSION}", meta.file_stem())
}

/// 同一输出目录内分配不重复的文件名
///
/// 比较不区分大小写；重名时依次追加 `_2`、`_3` ……
#[derive(Debug, Default)]
pub struct OutputNames {
    used: HashSet<String>,
}

impl OutputNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为一条记录分配文件名并登记
    pub fn claim(&mut self, meta: &WavMetadata) -> String {
        let mut candidate = output_file_name(meta);
        let mut suffix = 2;
        while !self.used.insert(candidate.to_lowercase()) {
            candidate = format!("{}_{suffix}.{AAF_XML_EXTENSION}", meta.file_stem());
            suffix += 1;
        }
        candidate
    }
}

/// 以 `file_name` 写出到目录，返回生成的文件路径
pub fn write_aaf_xml(
    output_dir: &Path,
    file_name: &str,
    meta: &WavMetadata,
    file_path: &Path,
    ucs: Option<&UcsTable>,
) -> AppResult<PathBuf> {
    let document = to_aaf_xml(meta, file_path, ucs, Local::now())?;
    let path = output_dir.join(file_name);
    std::fs::write(&path, document)
        .map_err(|e| output_error(&format!("写入XML失败 {}", path.display()), e))?;
    Ok(path)
}
