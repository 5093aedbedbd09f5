use alloy::sol;

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
    }
}
