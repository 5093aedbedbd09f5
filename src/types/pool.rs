use alloy::sol;

sol! {
    /// A deposit that left the home chain and has not been acknowledged yet.
    ///
    /// Slots of the home pool's buffer that are free carry a zero message id.
    #[derive(Debug, Default, Copy, PartialEq, Eq)]
    struct DepositOnTheWay {
        uint64 chainSelector;
        bytes32 ccipMessageId;
        uint256 amount;
    }

    /// The subset of the liquidity pool contract the reconciler talks to.
    ///
    /// Child pools and the home (parent) pool share these signatures.
    #[sol(rpc)]
    #[derive(Debug)]
    interface IPool {
        /// Emitted by a pool once a cross-chain message was delivered to it.
        event CCIPReceived(
            bytes32 indexed ccipMessageId,
            uint64 srcChainSelector,
            address sender,
            address token,
            uint256 amount
        );

        function getUsdcLoansInUse() external view returns (uint256);

        function getDepositsOnTheWay() external view returns (DepositOnTheWay[150] memory);

        function ccipSendToPool(
            uint64 chainSelector,
            uint256 amount,
            bytes32 withdrawalId
        ) external;

        function distributeLiquidity(
            uint64 chainSelector,
            uint256 amount,
            bytes32 requestId
        ) external;
    }
}
