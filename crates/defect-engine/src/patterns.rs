//! Lexicons and pattern helpers shared by the detectors

use regex::{Regex, RegexBuilder};

/// Misspellings frequently seen in Chinese legal writing, with corrections
pub const LEGAL_CONFUSIONS_ZH: &[(&str, &str)] = &[
    ("程序正档", "程序正当"),
    ("不认醉", "不认罪"),
    ("不分人罪", "部分认罪"),
    ("斗不能", "都不能"),
    ("承若", "承诺"),
    ("要阅", "要约"),
    ("标地物", "标的物"),
    ("抵压", "抵押"),
    ("质压", "质押"),
    ("赔尝", "赔偿"),
    ("仲栽", "仲裁"),
    ("诉颂", "诉讼"),
    ("判绝", "判决"),
    ("裁绝", "裁决"),
    ("委拖", "委托"),
    ("履形", "履行"),
    ("当事仁", "当事人"),
    ("合法全益", "合法权益"),
    ("法定带表人", "法定代表人"),
    ("原吿", "原告"),
    ("被吿", "被告"),
    ("既判立", "既判力"),
    ("管辖权异义", "管辖权异议"),
    ("举正责任", "举证责任"),
    ("证剧", "证据"),
    ("罚欵", "罚款"),
    ("撤消", "撤销"),
];

/// English legal-term misspellings, with corrections
pub const LEGAL_CONFUSIONS_EN: &[(&str, &str)] = &[
    ("recieve", "receive"),
    ("tennant", "tenant"),
    ("tenent", "tenant"),
    ("liabilty", "liability"),
    ("liablity", "liability"),
    ("indemnifcation", "indemnification"),
    ("agreemnet", "agreement"),
    ("aggreement", "agreement"),
    ("termiante", "terminate"),
    ("jurisdicton", "jurisdiction"),
    ("arbitraton", "arbitration"),
    ("plaintif", "plaintiff"),
    ("defendent", "defendant"),
    ("occured", "occurred"),
    ("seperate", "separate"),
    ("heretofor", "heretofore"),
    ("notwithstandng", "notwithstanding"),
    ("guarentee", "guarantee"),
    ("warrenty", "warranty"),
    ("lisence", "license"),
    ("comission", "commission"),
    ("priviledge", "privilege"),
    ("accomodate", "accommodate"),
    ("untill", "until"),
];

/// Words that legitimately appear twice in a row
pub const LEGITIMATE_REPEATS: &[&str] = &["that", "had"];

/// Vowel-initial words pronounced with a leading consonant sound ("a user")
pub const CONSONANT_SOUND_VOWEL_START: &[&str] = &[
    "one", "once", "unanimous", "uniform", "union", "unique", "unit", "united", "university",
    "usage", "use", "used", "user", "usual", "utility", "european",
];

/// Consonant-initial words pronounced with a leading vowel sound ("an hour")
pub const VOWEL_SOUND_CONSONANT_START: &[&str] =
    &["heir", "honest", "honor", "honorable", "honour", "hour", "hourly"];

/// Article counts of statutes in force
pub const STATUTE_ARTICLE_COUNTS: &[(&str, u32)] = &[
    ("民法典", 1260),
    ("刑法", 452),
    ("民事诉讼法", 306),
    ("刑事诉讼法", 308),
    ("行政诉讼法", 103),
    ("公司法", 266),
    ("劳动合同法", 98),
    ("劳动法", 107),
    ("行政处罚法", 86),
    ("消费者权益保护法", 63),
    ("著作权法", 67),
    ("商标法", 73),
    ("专利法", 82),
];

/// Statutes repealed when the Civil Code took effect on 2021-01-01
pub const REPEALED_STATUTES: &[&str] = &[
    "合同法",
    "物权法",
    "担保法",
    "婚姻法",
    "继承法",
    "民法通则",
    "民法总则",
    "侵权责任法",
    "收养法",
];

/// Contract parties (Chinese)
pub const PARTY_TERMS_ZH: &[&str] = &[
    "甲方", "乙方", "丙方", "出租人", "承租人", "出卖人", "买受人", "买方", "卖方", "委托人",
    "受托人", "用人单位", "劳动者", "借款人", "贷款人", "保证人", "承包人", "发包人",
];

/// Contract parties (English)
pub const PARTY_TERMS_EN: &[&str] = &[
    "landlord", "tenant", "lessor", "lessee", "buyer", "seller", "purchaser", "vendor",
    "employer", "employee", "contractor", "owner", "licensor", "licensee", "borrower",
    "lender", "party a", "party b",
];

/// Modal phrases forbidding an action
pub const PROHIBITION_MARKERS: &[&str] = &[
    "不得",
    "禁止",
    "严禁",
    "不应当",
    "不应",
    "不可以",
    "不能",
    "无权",
    "shall not",
    "must not",
    "may not",
    "is prohibited from",
    "are prohibited from",
    "is not permitted to",
];

/// Modal phrases requiring an action
pub const OBLIGATION_MARKERS: &[&str] = &[
    "应当",
    "必须",
    "务必",
    "须",
    "应",
    "shall",
    "must",
    "is required to",
    "are required to",
    "agrees to",
];

/// Modal phrases allowing an action
pub const PERMISSION_MARKERS: &[&str] = &[
    "有权",
    "可以",
    "may",
    "is entitled to",
    "is permitted to",
    "has the right to",
];

/// Characters that end a clause
pub const CLAUSE_DELIMITERS: &[char] = &['。', '；', ';', '.', '!', '?', '！', '？', '\n'];

/// Leading connectives stripped before identifying a clause's party
pub const CLAUSE_CONNECTIVES: &[&str] = &[
    "但是", "但", "并且", "且", "同时", "如果", "如", "若", "however,", "however", "and", "but",
    "the",
];

/// Build a leftmost-longest alternation over literal terms.
///
/// ASCII terms are wrapped in word boundaries; CJK terms are not, since CJK
/// text has no spaces between words.
pub fn build_alternation<S: AsRef<str>>(
    terms: &[S],
    case_insensitive: bool,
) -> Result<Regex, regex::Error> {
    let mut sorted: Vec<&str> = terms.iter().map(AsRef::as_ref).collect();
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    sorted.dedup();

    let pattern = sorted
        .iter()
        .map(|term| {
            if term.is_ascii() {
                format!(r"\b{}\b", regex::escape(term))
            } else {
                regex::escape(term)
            }
        })
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&format!("(?:{})", pattern))
        .case_insensitive(case_insensitive)
        .build()
}

/// Shorten text for quoting in a message (up to `max_chars` characters)
pub fn snippet(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Carry the capitalisation of `original` over to `replacement`
pub fn match_case(original: &str, replacement: &str) -> String {
    let mut chars = original.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            if original.len() > 1 && original.chars().all(|c| !c.is_lowercase()) {
                replacement.to_uppercase()
            } else {
                let mut out = String::with_capacity(replacement.len());
                let mut rep = replacement.chars();
                if let Some(r) = rep.next() {
                    out.extend(r.to_uppercase());
                }
                out.extend(rep);
                out
            }
        }
        _ => replacement.to_string(),
    }
}
