use crate::{model::QueryPage, QueryEngine, UdqResult};

use super::QueryRequest;

/// 只传 `MaxRows` 时，跳过空页重新查询的最大次数
pub const MAX_EMPTY_PAGE_SKIPS: usize = 1000;

/// 执行查询并处理翻页的特殊情况。
///
/// - 同时有 token 和行数：两者都传
/// - 只有 token：只传 token
/// - 只有行数：只传行数。引擎在跳过内部分片时可能返回有 token 但没有数据的页，
///   此时带着 token 和相同的行数重新查询，直到拿到有数据的页或者没有 token 为止
/// - 都没有：直接查询
///
/// 空字符串 token 和 `0` 行数视为没有设置。
pub async fn fetch_page<E>(engine: &E, query_string: &str, next_token: Option<&str>, max_rows: Option<u32>) -> UdqResult<QueryPage>
where
    E: QueryEngine + ?Sized,
{
    let next_token = next_token.filter(|s| !s.is_empty());
    let max_rows = max_rows.filter(|n| *n > 0);

    let result = match (next_token, max_rows) {
        (Some(token), Some(n)) => engine.execute(QueryRequest::new(query_string).next_token(token).max_rows(n)).await,
        (Some(token), None) => engine.execute(QueryRequest::new(query_string).next_token(token)).await,
        (None, Some(n)) => skip_empty_pages(engine, query_string, n).await,
        (None, None) => engine.execute(QueryRequest::new(query_string)).await,
    };

    result.inspect_err(|e| log::error!("Exception while running query: {}", e))
}

async fn skip_empty_pages<E>(engine: &E, query_string: &str, max_rows: u32) -> UdqResult<QueryPage>
where
    E: QueryEngine + ?Sized,
{
    let mut page = engine.execute(QueryRequest::new(query_string).max_rows(max_rows)).await?;
    let mut skipped = 0usize;

    while page.rows.is_empty() {
        let Some(token) = page.next_token.as_deref() else {
            break;
        };

        if skipped >= MAX_EMPTY_PAGE_SKIPS {
            log::warn!("still no rows after skipping {} empty pages, returning the empty page with its token", skipped);
            break;
        }

        log::debug!("skip empty page #{}", skipped + 1);
        let request = QueryRequest::new(query_string).next_token(token).max_rows(max_rows);
        page = engine.execute(request).await?;
        skipped += 1;
    }

    Ok(page)
}
