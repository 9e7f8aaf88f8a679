//! EVM contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings for the token
//! gateway and the ERC-20 tokens it pulls from.

#![allow(clippy::too_many_arguments)]

use alloy::sol;

sol! {
    /// Token gateway interface (teleport entry point only)
    #[sol(rpc)]
    contract TokenGateway {
        /// Parameters of an outgoing teleport
        struct TeleportParams {
            /// Amount to teleport, in the token's smallest unit
            uint256 amount;
            /// Fee paid to the relayer on the destination
            uint256 relayerFee;
            /// Gateway asset identifier
            bytes32 assetId;
            /// Redeem the ERC-20 on the destination instead of minting
            bool redeem;
            /// Destination account, left-padded to 32 bytes
            bytes32 to;
            /// Destination state machine id
            bytes dest;
            /// Request timeout in seconds (0 = none)
            uint64 timeout;
            /// Native token paid instead of the fee token
            uint256 nativeCost;
            /// Optional call data for the destination
            bytes data;
        }

        /// Teleport tokens to another chain
        function teleport(TeleportParams teleportParams) external payable;
    }

    /// Standard ERC20 interface
    #[sol(rpc)]
    contract ERC20 {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
