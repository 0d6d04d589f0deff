//! Zhihu endpoints, header values and page selectors

pub const PLATFORM_KEY: &str = "zhihu";

pub const ZHIHU_URL: &str = "https://www.zhihu.com";
pub const ZHIHU_ZHUANLAN_URL: &str = "https://zhuanlan.zhihu.com";
pub const COOKIE_DOMAIN: &str = ".zhihu.com";
pub const LOGIN_URL: &str = "https://www.zhihu.com/signin";

/// Visiting a search page sets cookies the search API insists on
pub const SEARCH_WARMUP_PATH: &str =
    "/search?q=python&search_source=Guess&utm_content=search_hot&type=content";

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

/// Fingerprint cookie the signature is derived from
pub const FINGERPRINT_COOKIE: &str = "d_c0";
/// Cookie present only on a logged-in session
pub const AUTH_COOKIE: &str = "z_c0";

pub const ZSE_93: &str = "101_3_3.0";
pub const API_VERSION: &str = "3.0.91";

pub const SEARCH_PAGE_SIZE: u32 = 20;
pub const COMMENT_PAGE_SIZE: u32 = 10;
pub const CREATOR_PAGE_SIZE: u32 = 20;
pub const QUESTION_PAGE_SIZE: u32 = 20;

pub const ME_INCLUDE: &str = "email,is_active,is_bind_phone";

pub const CREATOR_ANSWERS_INCLUDE: &str = "data[*].is_normal,admin_closed_comment,reward_info,is_collapsed,annotation_action,annotation_detail,collapse_reason,collapsed_by,suggest_edit,comment_count,can_comment,content,editable_content,attachment,voteup_count,reshipment_settings,comment_permission,created_time,updated_time,review_info,excerpt,paid_info,reaction_instruction,is_labeled,label_info,relationship.is_authorized,voting,is_author,is_thanked,is_nothelp;data[*].vessay_info;data[*].author.badge[?(type=best_answerer)].topics;data[*].author.vip_info;data[*].question.has_publishing_draft,relationship";

pub const CREATOR_ARTICLES_INCLUDE: &str = "data[*].comment_count,suggest_edit,is_normal,thumbnail_extra_info,thumbnail,can_comment,comment_permission,admin_closed_comment,content,voteup_count,created,updated,upvoted_followees,voting,review_info,reaction_instruction,is_labeled,label_info;data[*].vessay_info;data[*].author.badge[?(type=best_answerer)].topics;data[*].author.vip_info;";

pub const CREATOR_VIDEOS_INCLUDE: &str =
    "similar_zvideo,creation_relationship,reaction_instruction";

pub const QUESTION_ANSWERS_INCLUDE: &str = "data[*].is_normal,admin_closed_comment,reward_info,is_collapsed,annotation_action,annotation_detail,collapse_reason,collapsed_by,suggest_edit,comment_count,can_comment,content,editable_content,attachment,voteup_count,reshipment_settings,comment_permission,created_time,updated_time,review_info,excerpt,paid_info,reaction_instruction,is_labeled,label_info";

pub const QR_CODE_SELECTOR: &str = "canvas.Qrcode-qrcode";
pub const PHONE_INPUT_SELECTOR: &str = "input[name='username']";
pub const SEND_CODE_SELECTOR: &str = "button.CountingDownButton";

/// Text the captcha interstitial carries
pub const CAPTCHA_MARKER: &str = "验证码";
