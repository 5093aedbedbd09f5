use super::settle_writes;
use crate::{chains::Chains, error::ReconcilerError, types::WithdrawalCollectionRequest};
use tracing::info;

/// Asks every non-home pool to send `amount_per_pool` to the home pool, tagged with the withdrawal
/// id.
///
/// Writes are independent: pools that submitted are not rolled back when another one fails.
/// Returns the number of submitted writes.
pub async fn collect_withdrawal(
    chains: &Chains,
    request: &WithdrawalCollectionRequest,
) -> Result<usize, ReconcilerError> {
    let home = chains.home().selector;
    info!(
        withdrawal_id = %request.withdrawal_id,
        amount_per_pool = %request.amount_per_pool,
        pools = chains.remote().count(),
        "Collecting withdrawal"
    );

    let writes = chains.remote().map(|chain| {
        let write = chain.pool.send_to_pool(home, request.amount_per_pool, request.withdrawal_id);
        (chain.selector, write)
    });
    Ok(settle_writes(writes).await?)
}
