//! Solidity interfaces of the name registration contracts as well as the gas
//! metering helper that gets injected into simulations.
//!
//! Only the functions that are needed for estimating gas are declared here,
//! the full ABIs are considerably larger.

pub mod networks {
    pub const MAINNET: u64 = 1;
    pub const GOERLI: u64 = 5;
    pub const SEPOLIA: u64 = 11155111;
    /// Development chain served with fixed estimates instead of simulations.
    pub const LOCAL: u64 = 1337;
}

alloy::sol! {
    /// The `.eth` registrar controller (the version with name wrapper
    /// support).
    #[sol(all_derives)]
    interface ETHRegistrarController {
        struct Price {
            uint256 base;
            uint256 premium;
        }

        function rentPrice(string name, uint256 duration) external view returns (Price price);

        function register(
            string name,
            address owner,
            uint256 duration,
            bytes32 secret,
            address resolver,
            bytes[] data,
            bool reverseRecord,
            uint16 ownerControlledFuses
        ) external payable;

        function renew(string name, uint256 duration) external payable;
    }

    /// Aggregator contract renewing multiple names in a single transaction.
    #[sol(all_derives)]
    interface BulkRenewal {
        function rentPrice(string[] names, uint256 duration) external view returns (uint256 total);

        function renewAll(string[] names, uint256 duration) external payable;
    }
}

alloy::sol! {
    /// Helper contract that measures the gas used by running `data` as
    /// `target`'s code in its own context and returns the amount, bubbling
    /// up reverts.
    ///
    /// The runtime code is hand assembled and ignores the function
    /// selector. Annotated:
    ///
    /// ```text
    /// 0x00  PUSH1 0x24 CALLDATALOAD PUSH1 0x04 ADD   ; position of data length
    /// 0x06  DUP1 CALLDATALOAD SWAP1 PUSH1 0x20 ADD   ; len, data start
    /// 0x0c  DUP2 SWAP1 PUSH1 0x00 CALLDATACOPY       ; memory[0..len] = data
    /// 0x11  GAS SWAP1                                ; gas before
    /// 0x13  PUSH1 0 PUSH1 0 SWAP2 PUSH1 0            ; ret/args layout
    /// 0x1a  PUSH1 0x04 CALLDATALOAD GAS DELEGATECALL ; run target code
    /// 0x1f  GAS SWAP1 PUSH1 0x2e JUMPI               ; gas after, success?
    /// 0x24  RETURNDATACOPY + REVERT                  ; bubble revert data
    /// 0x2e  JUMPDEST SWAP1 SUB                       ; before - after
    /// 0x31  MSTORE + RETURN                          ; return uint256
    /// ```
    #[sol(
        deployed_bytecode = "0x60243560040180359060200181906000375a90600060009160006004355af45a90602e573d600060003e3d6000fd5b900360005260206000f3"
    )]
    contract GasMeter {
        function measure(address target, bytes data) external payable returns (uint256 gasUsed);
    }

    /// Variant of [`GasMeter`] used for renewals. After measuring it returns
    /// any value that is left on the meter account to the caller, so
    /// overpaid renewal fees do not get stuck on the relay.
    ///
    /// ```text
    /// 0x31  PUSH1 0 (x4) SELFBALANCE CALLER GAS CALL POP
    /// ```
    #[sol(
        deployed_bytecode = "0x60243560040180359060200181906000375a90600060009160006004355af45a90602e573d600060003e3d6000fd5b9003600060006000600047335af15060005260206000f3"
    )]
    contract RenewalGasMeter {
        function measure(address target, bytes data) external payable returns (uint256 gasUsed);
    }
}
