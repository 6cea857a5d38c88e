use crate::clients::SearchItem;
use crate::store::Article;
use crate::util::text::{clean_snippet, truncate_chars};

/// カードに表示する日付の文字数。
const DISPLAY_DATE_CHARS: usize = 16;

/// 検索APIの1件を記事に正規化する。
///
/// 元記事のリンクが空でなければそちらを優先する。
pub(crate) fn normalize_item(item: SearchItem) -> Article {
    let link = if item.originallink.trim().is_empty() {
        item.link
    } else {
        item.originallink
    };

    Article {
        title: clean_snippet(&item.title),
        link,
        display_date: truncate_chars(&item.pub_date, DISPLAY_DATE_CHARS),
        origin_date: item.pub_date,
        description: clean_snippet(&item.description),
    }
}
